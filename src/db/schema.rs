//! Static resource table.
//!
//! Every store and the data-access layer resolve table names, primary-key
//! columns, business columns and foreign-key references through
//! [`RESOURCES`]. Nothing is inferred from a resource name: `medicalHistories`
//! maps to `medical_history_id` because the table says so.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::StoreError;

/// A named collection of entity records in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    #[serde(rename = "patients")]
    Patients,
    #[serde(rename = "doctors")]
    Doctors,
    #[serde(rename = "appointments")]
    Appointments,
    #[serde(rename = "billings")]
    Billings,
    #[serde(rename = "insurance")]
    Insurance,
    #[serde(rename = "medicalHistories")]
    MedicalHistories,
    #[serde(rename = "medications")]
    Medications,
    #[serde(rename = "diagnosticTestResults")]
    DiagnosticTestResults,
}

/// Foreign-key reference decorated with a display name on read.
#[derive(Debug)]
pub struct Reference {
    /// FK column on the referencing table.
    pub column: &'static str,
    pub target: Resource,
    /// Transient field written on each row, e.g. `patientName`.
    pub display_field: &'static str,
}

#[derive(Debug)]
pub struct ResourceSpec {
    pub resource: Resource,
    /// Public resource name (API path segment).
    pub name: &'static str,
    /// Singular label used in user-facing messages.
    pub label: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    /// Business columns in insertion order. Excludes the primary key.
    pub columns: &'static [&'static str],
    pub required: &'static [&'static str],
    pub references: &'static [Reference],
    /// Column shown when another resource references this one.
    pub display_column: &'static str,
}

const PATIENT_REF: Reference = Reference {
    column: "patient_id",
    target: Resource::Patients,
    display_field: "patientName",
};

const DOCTOR_REF: Reference = Reference {
    column: "doctor_id",
    target: Resource::Doctors,
    display_field: "doctorName",
};

/// Indexed by `Resource as usize`.
pub static RESOURCES: [ResourceSpec; 8] = [
    ResourceSpec {
        resource: Resource::Patients,
        name: "patients",
        label: "Patient",
        table: "patient",
        primary_key: "patient_id",
        columns: &["name", "date_of_birth", "gender", "contact_details"],
        required: &["name", "date_of_birth", "gender", "contact_details"],
        references: &[],
        display_column: "name",
    },
    ResourceSpec {
        resource: Resource::Doctors,
        name: "doctors",
        label: "Doctor",
        table: "doctor",
        primary_key: "doctor_id",
        columns: &["name", "specialization", "contact_details"],
        required: &["name", "specialization", "contact_details"],
        references: &[],
        display_column: "name",
    },
    ResourceSpec {
        resource: Resource::Appointments,
        name: "appointments",
        label: "Appointment",
        table: "appointment",
        primary_key: "appointment_id",
        columns: &["patient_id", "doctor_id", "appointment_date", "reason"],
        required: &["patient_id", "doctor_id", "appointment_date", "reason"],
        references: &[PATIENT_REF, DOCTOR_REF],
        display_column: "reason",
    },
    ResourceSpec {
        resource: Resource::Billings,
        name: "billings",
        label: "Billing record",
        table: "billing",
        primary_key: "billing_id",
        columns: &["patient_id", "amount", "payment_date"],
        required: &["patient_id", "amount", "payment_date"],
        references: &[PATIENT_REF],
        display_column: "payment_date",
    },
    ResourceSpec {
        resource: Resource::Insurance,
        name: "insurance",
        label: "Insurance record",
        table: "insurance",
        primary_key: "insurance_id",
        columns: &["patient_id", "provider_name", "policy_number", "coverage_details"],
        required: &["patient_id", "provider_name", "policy_number"],
        references: &[PATIENT_REF],
        display_column: "provider_name",
    },
    ResourceSpec {
        resource: Resource::MedicalHistories,
        name: "medicalHistories",
        label: "Medical history",
        table: "medical_history",
        primary_key: "medical_history_id",
        columns: &["patient_id", "medical_conditions", "allergies", "surgeries", "treatments"],
        required: &["patient_id", "medical_conditions"],
        references: &[PATIENT_REF],
        display_column: "medical_conditions",
    },
    ResourceSpec {
        resource: Resource::Medications,
        name: "medications",
        label: "Medication",
        table: "medication",
        primary_key: "medication_id",
        columns: &["patient_id", "name", "dosage", "frequency", "duration"],
        required: &["patient_id", "name", "dosage"],
        references: &[PATIENT_REF],
        display_column: "name",
    },
    ResourceSpec {
        resource: Resource::DiagnosticTestResults,
        name: "diagnosticTestResults",
        label: "Diagnostic test result",
        table: "diagnostic_test_result",
        primary_key: "diagnostic_test_result_id",
        columns: &["patient_id", "result", "date_taken"],
        required: &["patient_id", "result", "date_taken"],
        references: &[PATIENT_REF],
        display_column: "result",
    },
];

impl Resource {
    pub const ALL: [Resource; 8] = [
        Resource::Patients,
        Resource::Doctors,
        Resource::Appointments,
        Resource::Billings,
        Resource::Insurance,
        Resource::MedicalHistories,
        Resource::Medications,
        Resource::DiagnosticTestResults,
    ];

    pub fn spec(self) -> &'static ResourceSpec {
        &RESOURCES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn table(self) -> &'static str {
        self.spec().table
    }

    pub fn primary_key(self) -> &'static str {
        self.spec().primary_key
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }
}

impl ResourceSpec {
    /// Resolve a caller-supplied column name to the static one, so SQL and
    /// URLs are only ever built from names in this table.
    pub fn column(&self, column: &str) -> Result<&'static str, StoreError> {
        if column == self.primary_key {
            return Ok(self.primary_key);
        }
        self.columns
            .iter()
            .copied()
            .find(|c| *c == column)
            .ok_or_else(|| StoreError::UnknownColumn {
                table: self.table.into(),
                column: column.into(),
            })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| StoreError::UnknownResource(s.into()))
    }
}
