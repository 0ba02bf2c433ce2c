use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{dashboard, DataError};
use crate::db::{BackingStore, Query, Resource, ResourceSpec, Row, StoreError};
use crate::models::{
    Appointment, Billing, DashboardStats, DiagnosticTestResult, Doctor, Entity, Insurance,
    MedicalHistory, Medication, Patient, UNKNOWN_NAME,
};

/// Stateless accessor over one injected store. Cheap to clone.
#[derive(Clone)]
pub struct DataAccess {
    store: Arc<dyn BackingStore>,
}

impl DataAccess {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self { store }
    }

    /// Run a blocking store call off the async runtime.
    async fn blocking<R, F>(&self, f: F) -> Result<R, DataError>
    where
        F: FnOnce(&dyn BackingStore) -> Result<R, DataError> + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| DataError::Backend(e.to_string()))?
    }

    /// Resolve a public resource name, e.g. `"medicalHistories"`.
    pub fn resource_named(name: &str) -> Result<Resource, DataError> {
        name.parse::<Resource>().map_err(DataError::from)
    }

    // ── Read ────────────────────────────────────────────────

    /// All rows of a resource, decorated with `<role>Name` for each
    /// foreign key ("Unknown" when the reference does not resolve).
    pub async fn fetch_rows(&self, resource: Resource) -> Result<Vec<Row>, DataError> {
        self.select_rows(resource, Query::all()).await
    }

    pub async fn fetch_all<T: Entity>(&self) -> Result<Vec<T>, DataError> {
        let rows = self.fetch_rows(T::RESOURCE).await?;
        rows.into_iter().map(decode::<T>).collect()
    }

    async fn select_rows(&self, resource: Resource, query: Query) -> Result<Vec<Row>, DataError> {
        let rows = self
            .blocking(move |store| {
                let mut rows = store.select(resource, &query)?;
                decorate(store, resource.spec(), &mut rows)?;
                Ok(rows)
            })
            .await?;
        tracing::debug!(resource = %resource, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    async fn count(&self, resource: Resource) -> Result<u64, DataError> {
        self.blocking(move |store| Ok(store.count(resource, &[])?)).await
    }

    // ── Write ───────────────────────────────────────────────

    /// Insert the record's business fields. The identifier and display-only
    /// fields are never sent; the store assigns the identifier.
    pub async fn create<T: Entity>(&self, record: &T) -> Result<T, DataError> {
        let value = serde_json::to_value(record).map_err(|e| DataError::Decode {
            resource: T::RESOURCE,
            reason: e.to_string(),
        })?;
        let stored = self.create_row(T::RESOURCE, value).await?;
        decode::<T>(stored)
    }

    /// Insert an untyped record. The business row must decode as the
    /// resource's entity type, so every stored row stays readable.
    pub async fn create_row(&self, resource: Resource, record: Value) -> Result<Row, DataError> {
        let row = business_row(resource.spec(), record)?;
        check_row(resource, &row)?;
        let stored = self
            .blocking(move |store| Ok(store.insert(resource, row)?))
            .await?;
        let id = stored.get(resource.primary_key()).and_then(|v| v.as_i64());
        tracing::info!(resource = %resource, id, "Record created");
        Ok(stored)
    }

    pub async fn remove<T: Entity>(&self, id: i64) -> Result<(), DataError> {
        self.remove_from(T::RESOURCE, id).await
    }

    /// Delete by primary key. An absent id is reported as `NotFound`.
    pub async fn remove_from(&self, resource: Resource, id: i64) -> Result<(), DataError> {
        let affected = self
            .blocking(move |store| Ok(store.delete(resource, id)?))
            .await?;
        if affected == 0 {
            tracing::warn!(resource = %resource, id, "Delete target not found");
            return Err(DataError::NotFound { resource, id });
        }
        tracing::info!(resource = %resource, id, "Record deleted");
        Ok(())
    }

    // ── Dashboard ───────────────────────────────────────────

    /// Counts plus recent patients and upcoming appointments. Any failed
    /// read fails the whole call.
    pub async fn get_dashboard_stats(&self, now: DateTime<Utc>) -> Result<DashboardStats, DataError> {
        let recent_query = Query::all()
            .order_by(Resource::Patients.primary_key(), false)
            .limit(dashboard::RECENT_PATIENTS_LIMIT);

        let (total_patients, total_doctors, total_appointments, recent, appointments) = tokio::try_join!(
            self.count(Resource::Patients),
            self.count(Resource::Doctors),
            self.count(Resource::Appointments),
            self.select_rows(Resource::Patients, recent_query),
            self.fetch_all::<Appointment>(),
        )?;

        let recent = recent
            .into_iter()
            .map(decode::<Patient>)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dashboard::build_stats(
            total_patients,
            total_doctors,
            total_appointments,
            recent,
            appointments,
            now,
        ))
    }
}

fn decode<T: Entity>(row: Row) -> Result<T, DataError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DataError::Decode {
        resource: T::RESOURCE,
        reason: e.to_string(),
    })
}

/// Keep only business columns and check required ones are present.
fn business_row(spec: &ResourceSpec, record: Value) -> Result<Row, DataError> {
    let Value::Object(fields) = record else {
        return Err(DataError::Decode {
            resource: spec.resource,
            reason: "expected a JSON object".into(),
        });
    };

    let mut row = Row::new();
    for column in spec.columns {
        if let Some(value) = fields.get(*column) {
            row.insert((*column).to_string(), value.clone());
        }
    }

    let missing: Vec<&str> = spec
        .required
        .iter()
        .copied()
        .filter(|column| is_blank(row.get(*column)))
        .collect();
    if !missing.is_empty() {
        return Err(DataError::Validation(missing.join(", ")));
    }
    Ok(row)
}

/// Decode `row` as the entity type of `resource`.
fn check_row(resource: Resource, row: &Row) -> Result<(), DataError> {
    fn check<T: Entity>(row: &Row) -> Result<(), DataError> {
        serde_json::from_value::<T>(Value::Object(row.clone()))
            .map(|_| ())
            .map_err(|e| DataError::Invalid { resource: T::RESOURCE, reason: e.to_string() })
    }

    match resource {
        Resource::Patients => check::<Patient>(row),
        Resource::Doctors => check::<Doctor>(row),
        Resource::Appointments => check::<Appointment>(row),
        Resource::Billings => check::<Billing>(row),
        Resource::Insurance => check::<Insurance>(row),
        Resource::MedicalHistories => check::<MedicalHistory>(row),
        Resource::Medications => check::<Medication>(row),
        Resource::DiagnosticTestResults => check::<DiagnosticTestResult>(row),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Attach `<role>Name` for every foreign key of `spec`.
fn decorate(store: &dyn BackingStore, spec: &ResourceSpec, rows: &mut [Row]) -> Result<(), StoreError> {
    if rows.is_empty() {
        return Ok(());
    }
    for reference in spec.references {
        let target = reference.target.spec();
        let names: HashMap<i64, String> = store
            .select(reference.target, &Query::all())?
            .into_iter()
            .filter_map(|r| {
                let id = r.get(target.primary_key)?.as_i64()?;
                let name = r.get(target.display_column)?.as_str()?.to_string();
                Some((id, name))
            })
            .collect();

        for row in rows.iter_mut() {
            let name = row
                .get(reference.column)
                .and_then(Value::as_i64)
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string());
            row.insert(reference.display_field.to_string(), Value::String(name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};
    use crate::models::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn access(store: impl BackingStore + 'static) -> DataAccess {
        DataAccess::new(Arc::new(store))
    }

    fn seeded() -> DataAccess {
        access(MemoryStore::with_seed_data().unwrap())
    }

    fn ann() -> Patient {
        Patient::new("Ann", "1990-01-01", Gender::Female, "a@x.com")
    }

    #[tokio::test]
    async fn create_then_fetch_adds_exactly_one_with_fresh_id() {
        let data = seeded();
        let before: Vec<Patient> = data.fetch_all().await.unwrap();

        let created = data.create(&ann()).await.unwrap();
        let after: Vec<Patient> = data.fetch_all().await.unwrap();

        assert_eq!(after.len(), before.len() + 1);
        let new_id = created.patient_id.unwrap();
        assert!(before.iter().all(|p| p.patient_id != Some(new_id)));
        assert_eq!(after.iter().filter(|p| p.name == "Ann").count(), 1);
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id_and_display_fields() {
        let data = seeded();
        let mut record = Appointment::new(1, 2, "2024-05-01T09:00:00", "Consult");
        record.appointment_id = Some(1);
        record.patient_name = Some("Forged".into());

        let created = data.create(&record).await.unwrap();
        assert_eq!(created.appointment_id, Some(4));
        assert_eq!(created.patient_name, None);

        let listed: Vec<Appointment> = data.fetch_all().await.unwrap();
        let stored = listed.iter().find(|a| a.appointment_id == Some(4)).unwrap();
        assert_eq!(stored.patient_name.as_deref(), Some("John Doe"));
        assert_eq!(stored.doctor_name.as_deref(), Some("Dr. Michael Brown"));
    }

    #[tokio::test]
    async fn remove_then_fetch_has_no_such_id() {
        let data = seeded();
        data.remove::<Doctor>(2).await.unwrap();
        let doctors: Vec<Doctor> = data.fetch_all().await.unwrap();
        assert!(doctors.iter().all(|d| d.doctor_id != Some(2)));
        assert_eq!(doctors.len(), 2);
    }

    #[tokio::test]
    async fn remove_missing_id_is_not_found() {
        let data = seeded();
        let err = data.remove::<Patient>(404).await.unwrap_err();
        assert!(matches!(err, DataError::NotFound { id: 404, .. }));
        assert_eq!(err.to_string(), "Item not found");
        let patients: Vec<Patient> = data.fetch_all().await.unwrap();
        assert_eq!(patients.len(), 3);
    }

    #[tokio::test]
    async fn dangling_foreign_keys_decorate_as_unknown() {
        let data = seeded();
        data.create(&Appointment::new(99, 1, "2024-05-01T09:00:00", "Orphan"))
            .await
            .unwrap();
        data.remove::<Doctor>(1).await.unwrap();

        let appointments: Vec<Appointment> = data.fetch_all().await.unwrap();
        let orphan = appointments.iter().find(|a| a.reason == "Orphan").unwrap();
        assert_eq!(orphan.patient_name.as_deref(), Some(UNKNOWN_NAME));
        assert_eq!(orphan.doctor_name.as_deref(), Some(UNKNOWN_NAME));

        let first = appointments.iter().find(|a| a.appointment_id == Some(1)).unwrap();
        assert_eq!(first.patient_name.as_deref(), Some("John Doe"));
        assert_eq!(first.doctor_name.as_deref(), Some(UNKNOWN_NAME));
    }

    #[tokio::test]
    async fn child_resources_get_patient_names() {
        let data = seeded();
        let meds: Vec<Medication> = data.fetch_all().await.unwrap();
        assert_eq!(meds[0].patient_name.as_deref(), Some("John Doe"));
        let tests: Vec<DiagnosticTestResult> = data.fetch_all().await.unwrap();
        assert_eq!(tests[1].patient_name.as_deref(), Some("Robert Johnson"));
    }

    #[tokio::test]
    async fn patient_deleted_in_sqlite_leaves_unknown_history() {
        let data = access(SqliteStore::open_in_memory().unwrap());
        let patient = data.create(&ann()).await.unwrap();
        let pid = patient.patient_id.unwrap();
        data.create_row(
            Resource::MedicalHistories,
            json!({"patient_id": pid, "medical_conditions": "Asthma"}),
        )
        .await
        .unwrap();
        data.remove::<Patient>(pid).await.unwrap();

        let history: Vec<MedicalHistory> = data.fetch_all().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].patient_id, None);
        assert_eq!(history[0].patient_name.as_deref(), Some(UNKNOWN_NAME));
    }

    #[tokio::test]
    async fn missing_required_fields_are_rejected() {
        let data = seeded();
        let err = data.create(&Doctor::new("  ", "Cardiology", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing required field(s): name, contact_details");

        let err = data
            .create_row(Resource::Billings, json!({"amount": 10.0}))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Validation(fields) if fields == "patient_id, payment_date"));
    }

    #[tokio::test]
    async fn create_row_rejects_unknown_enum_value() {
        let data = seeded();
        let err = data
            .create_row(
                Resource::Patients,
                json!({"name": "Zed", "date_of_birth": "2000-01-01", "gender": "unknown", "contact_details": "z@x.com"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Invalid { resource: Resource::Patients, .. }));

        let patients: Vec<Patient> = data.fetch_all().await.unwrap();
        assert_eq!(patients.len(), 3);
        data.get_dashboard_stats(Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn create_row_rejects_wrongly_typed_field() {
        let data = seeded();
        let err = data
            .create_row(
                Resource::Appointments,
                json!({"patient_id": 1, "doctor_id": 1, "appointment_date": 20240101, "reason": "Typo"}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid appointments record"));

        let appointments: Vec<Appointment> = data.fetch_all().await.unwrap();
        assert_eq!(appointments.len(), 3);
    }

    #[tokio::test]
    async fn create_row_accepts_integer_amount() {
        let data = seeded();
        let row = data
            .create_row(
                Resource::Billings,
                json!({"patient_id": 3, "amount": 90, "payment_date": "2023-11-23"}),
            )
            .await
            .unwrap();
        assert_eq!(row["billing_id"], 3);
        let bills: Vec<Billing> = data.fetch_all().await.unwrap();
        assert_eq!(bills[2].amount, 90.0);
    }

    #[tokio::test]
    async fn backend_errors_pass_through() {
        let data = access(SqliteStore::open_in_memory().unwrap());
        let err = data
            .create(&Appointment::new(1, 1, "2024-05-01T09:00:00", "No such patient"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Store(_)));
        assert!(err.to_string().contains("FOREIGN KEY"));
    }

    #[test]
    fn unknown_resource_name_is_unsupported() {
        let err = DataAccess::resource_named("labs").unwrap_err();
        assert!(matches!(err, DataError::Unsupported(name) if name == "labs"));
    }

    #[tokio::test]
    async fn fetch_rows_by_name_matches_typed_fetch() {
        let data = seeded();
        let resource = DataAccess::resource_named("billings").unwrap();
        let rows = data.fetch_rows(resource).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["patientName"], "John Doe");
    }

    #[tokio::test]
    async fn dashboard_stats_over_seed_data() {
        let data = seeded();
        let now = Utc.with_ymd_and_hms(2023, 11, 20, 8, 0, 0).unwrap();
        let stats = data.get_dashboard_stats(now).await.unwrap();

        assert_eq!(stats.total_patients, 3);
        assert_eq!(stats.total_doctors, 3);
        assert_eq!(stats.total_appointments, 3);
        assert_eq!(stats.today_appointments, 1);
        let recent: Vec<i64> = stats.recent_patients.iter().filter_map(|p| p.patient_id).collect();
        assert_eq!(recent, vec![3, 2, 1]);
        assert_eq!(stats.upcoming_appointments.len(), 3);
        assert_eq!(stats.upcoming_appointments[0].doctor_name.as_deref(), Some("Dr. Sarah Wilson"));
    }

    struct FailingStore;

    impl BackingStore for FailingStore {
        fn select(&self, _: Resource, _: &Query) -> Result<Vec<Row>, StoreError> {
            Err(StoreError::Http("connection reset".into()))
        }
        fn count(&self, resource: Resource, _: &[crate::db::Filter]) -> Result<u64, StoreError> {
            match resource {
                Resource::Doctors => Err(StoreError::Http("connection reset".into())),
                _ => Ok(1),
            }
        }
        fn insert(&self, _: Resource, _: Row) -> Result<Row, StoreError> {
            Err(StoreError::Http("connection reset".into()))
        }
        fn delete(&self, _: Resource, _: i64) -> Result<u64, StoreError> {
            Err(StoreError::Http("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn dashboard_fails_whole_on_any_read_error() {
        let data = access(FailingStore);
        let err = data.get_dashboard_stats(Utc::now()).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: connection reset");
    }
}
