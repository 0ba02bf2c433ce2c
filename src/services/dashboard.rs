//! Dashboard aggregation over already-fetched collections.
//!
//! "Today" is the half-open range `[00:00, 24:00)` of the current UTC day.
//! Timestamps without an offset are read as UTC; timestamps that cannot be
//! parsed are never today's and never upcoming.

use std::cmp::Reverse;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::models::{Appointment, DashboardStats, Patient};

pub const RECENT_PATIENTS_LIMIT: usize = 5;
pub const UPCOMING_APPOINTMENTS_LIMIT: usize = 5;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an appointment timestamp to a UTC instant.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `[start, end)` of the UTC calendar day containing `now`.
pub fn day_range(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

pub fn count_today(appointments: &[Appointment], now: DateTime<Utc>) -> u64 {
    let (start, end) = day_range(now);
    appointments
        .iter()
        .filter_map(|a| parse_timestamp(&a.appointment_date))
        .filter(|ts| *ts >= start && *ts < end)
        .count() as u64
}

/// Appointments at or after `now`, earliest first, ties in list order.
pub fn upcoming_appointments(appointments: Vec<Appointment>, now: DateTime<Utc>) -> Vec<Appointment> {
    let mut future: Vec<(DateTime<Utc>, Appointment)> = appointments
        .into_iter()
        .filter_map(|a| parse_timestamp(&a.appointment_date).map(|ts| (ts, a)))
        .filter(|(ts, _)| *ts >= now)
        .collect();
    future.sort_by_key(|(ts, _)| *ts);
    future
        .into_iter()
        .take(UPCOMING_APPOINTMENTS_LIMIT)
        .map(|(_, a)| a)
        .collect()
}

/// Most recently created patients, i.e. highest identifiers first.
pub fn recent_patients(mut patients: Vec<Patient>) -> Vec<Patient> {
    patients.sort_by_key(|p| Reverse(p.patient_id.unwrap_or(0)));
    patients.truncate(RECENT_PATIENTS_LIMIT);
    patients
}

pub fn build_stats(
    total_patients: u64,
    total_doctors: u64,
    total_appointments: u64,
    recent: Vec<Patient>,
    appointments: Vec<Appointment>,
    now: DateTime<Utc>,
) -> DashboardStats {
    DashboardStats {
        total_patients,
        total_doctors,
        total_appointments,
        today_appointments: count_today(&appointments, now),
        recent_patients: recent_patients(recent),
        upcoming_appointments: upcoming_appointments(appointments, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn appt(id: i64, date: &str) -> Appointment {
        let mut a = Appointment::new(1, 1, date, "checkup");
        a.appointment_id = Some(id);
        a
    }

    fn patient(id: i64) -> Patient {
        let mut p = Patient::new(&format!("P{id}"), "1990-01-01", Gender::Other, "");
        p.patient_id = Some(id);
        p
    }

    #[test]
    fn parses_supported_timestamp_shapes() {
        let expected = at(2023, 11, 20, 10, 30);
        assert_eq!(parse_timestamp("2023-11-20T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-20 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-20T10:30"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-20T10:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-20T11:30:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-11-20"), Some(at(2023, 11, 20, 0, 0)));
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn late_evening_counts_as_today() {
        let now = at(2023, 11, 20, 8, 0);
        let list = vec![appt(1, "2023-11-20T23:59:00")];
        assert_eq!(count_today(&list, now), 1);
    }

    #[test]
    fn today_range_is_half_open() {
        let now = at(2023, 11, 20, 12, 0);
        let list = vec![
            appt(1, "2023-11-20T00:00:00"),
            appt(2, "2023-11-21T00:00:00"),
            appt(3, "2023-11-19T23:59:59"),
        ];
        assert_eq!(count_today(&list, now), 1);
    }

    #[test]
    fn offset_timestamps_are_compared_in_utc() {
        let now = at(2023, 11, 20, 12, 0);
        // 23:30 on the 20th in UTC-05:00 is 04:30 on the 21st in UTC.
        let list = vec![appt(1, "2023-11-20T23:30:00-05:00")];
        assert_eq!(count_today(&list, now), 0);
    }

    #[test]
    fn upcoming_returns_first_five_ascending() {
        let now = at(2024, 1, 1, 0, 0);
        let list = vec![
            appt(6, "2024-01-06T09:00:00"),
            appt(3, "2024-01-03T09:00:00"),
            appt(1, "2024-01-01T09:00:00"),
            appt(5, "2024-01-05T09:00:00"),
            appt(2, "2024-01-02T09:00:00"),
            appt(4, "2024-01-04T09:00:00"),
            appt(0, "2023-12-31T09:00:00"),
        ];
        let ids: Vec<i64> = upcoming_appointments(list, now)
            .iter()
            .map(|a| a.appointment_id.unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn upcoming_ties_keep_list_order() {
        let now = at(2024, 1, 1, 0, 0);
        let list = vec![appt(9, "2024-02-01T09:00:00"), appt(4, "2024-02-01T09:00:00")];
        let ids: Vec<i64> = upcoming_appointments(list, now)
            .iter()
            .map(|a| a.appointment_id.unwrap())
            .collect();
        assert_eq!(ids, vec![9, 4]);
    }

    #[test]
    fn upcoming_includes_now_and_skips_garbage() {
        let now = at(2024, 1, 1, 9, 0);
        let list = vec![appt(1, "2024-01-01T09:00:00"), appt(2, "soon")];
        assert_eq!(upcoming_appointments(list, now).len(), 1);
    }

    #[test]
    fn recent_patients_are_highest_ids_first() {
        let list = (1..=7).map(patient).collect();
        let ids: Vec<i64> = recent_patients(list)
            .iter()
            .map(|p| p.patient_id.unwrap())
            .collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn build_stats_combines_counts_and_lists() {
        let now = at(2023, 11, 20, 8, 0);
        let stats = build_stats(
            3,
            2,
            2,
            vec![patient(1), patient(2)],
            vec![appt(1, "2023-11-20T10:30:00"), appt(2, "2023-11-19T10:30:00")],
            now,
        );
        assert_eq!(stats.total_patients, 3);
        assert_eq!(stats.today_appointments, 1);
        assert_eq!(stats.upcoming_appointments.len(), 1);
        assert_eq!(stats.recent_patients[0].patient_id, Some(2));
    }
}
