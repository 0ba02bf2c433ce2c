use serde::{Deserialize, Serialize};

use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    /// ISO 8601 timestamp, e.g. `2023-11-20T10:30:00`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub appointment_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    /// Display only, never persisted.
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    /// Display only, never persisted.
    #[serde(rename = "doctorName", default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

impl_entity!(Appointment, Appointments);

impl Appointment {
    pub fn new(patient_id: i64, doctor_id: i64, appointment_date: &str, reason: &str) -> Self {
        Self {
            appointment_id: None,
            patient_id: Some(patient_id),
            doctor_id: Some(doctor_id),
            appointment_date: appointment_date.into(),
            reason: reason.into(),
            patient_name: None,
            doctor_name: None,
        }
    }
}
