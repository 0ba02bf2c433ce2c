//! Demo records loaded into an empty store.

use serde_json::{json, Value};

use super::{BackingStore, Resource, StoreError};

fn demo_rows() -> Vec<(Resource, Value)> {
    vec![
        (Resource::Patients, json!({"name": "John Doe", "date_of_birth": "1980-05-15", "gender": "Male", "contact_details": "john@example.com | 555-1234"})),
        (Resource::Patients, json!({"name": "Jane Smith", "date_of_birth": "1992-09-22", "gender": "Female", "contact_details": "jane@example.com | 555-5678"})),
        (Resource::Patients, json!({"name": "Robert Johnson", "date_of_birth": "1975-03-10", "gender": "Male", "contact_details": "robert@example.com | 555-9876"})),
        (Resource::Doctors, json!({"name": "Dr. Sarah Wilson", "specialization": "Cardiology", "contact_details": "sarah@hospital.com | 555-1111"})),
        (Resource::Doctors, json!({"name": "Dr. Michael Brown", "specialization": "Neurology", "contact_details": "michael@hospital.com | 555-2222"})),
        (Resource::Doctors, json!({"name": "Dr. Emily Davis", "specialization": "Pediatrics", "contact_details": "emily@hospital.com | 555-3333"})),
        (Resource::Appointments, json!({"patient_id": 1, "doctor_id": 1, "appointment_date": "2023-11-20T10:30:00", "reason": "Annual checkup"})),
        (Resource::Appointments, json!({"patient_id": 2, "doctor_id": 3, "appointment_date": "2023-11-21T14:00:00", "reason": "Flu symptoms"})),
        (Resource::Appointments, json!({"patient_id": 3, "doctor_id": 2, "appointment_date": "2023-11-22T09:15:00", "reason": "Follow-up visit"})),
        (Resource::Billings, json!({"patient_id": 1, "amount": 150.0, "payment_date": "2023-11-20"})),
        (Resource::Billings, json!({"patient_id": 2, "amount": 200.0, "payment_date": "2023-11-21"})),
        (Resource::DiagnosticTestResults, json!({"patient_id": 1, "result": "Normal", "date_taken": "2023-11-18"})),
        (Resource::DiagnosticTestResults, json!({"patient_id": 3, "result": "Abnormal", "date_taken": "2023-11-19"})),
        (Resource::Insurance, json!({"patient_id": 1, "provider_name": "BlueShield", "policy_number": "BS12345", "coverage_details": "Full coverage"})),
        (Resource::Insurance, json!({"patient_id": 2, "provider_name": "HealthPlus", "policy_number": "HP67890", "coverage_details": "Partial coverage"})),
        (Resource::MedicalHistories, json!({"patient_id": 1, "medical_conditions": "Hypertension", "allergies": "Penicillin", "surgeries": "Appendectomy 2015", "treatments": "Blood pressure medication"})),
        (Resource::MedicalHistories, json!({"patient_id": 3, "medical_conditions": "Diabetes Type 2", "allergies": "None", "surgeries": "None", "treatments": "Insulin therapy"})),
        (Resource::Medications, json!({"patient_id": 1, "name": "Lisinopril", "dosage": "10mg", "frequency": "Once daily", "duration": "Ongoing"})),
        (Resource::Medications, json!({"patient_id": 3, "name": "Metformin", "dosage": "500mg", "frequency": "Twice daily", "duration": "6 months"})),
    ]
}

/// Insert the demo records. Foreign keys assume a store whose patient and
/// doctor sequences start at 1.
pub fn seed_demo_data(store: &dyn BackingStore) -> Result<(), StoreError> {
    for (resource, value) in demo_rows() {
        let Value::Object(row) = value else {
            continue;
        };
        store.insert(resource, row)?;
    }
    tracing::info!("Seeded demo records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    #[test]
    fn seeds_sqlite_with_valid_foreign_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed_demo_data(&store).unwrap();
        assert_eq!(store.count(Resource::Medications, &[]).unwrap(), 2);
        assert_eq!(store.count(Resource::MedicalHistories, &[]).unwrap(), 2);
    }
}
