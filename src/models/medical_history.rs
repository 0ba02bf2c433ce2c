use serde::{Deserialize, Serialize};

use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history_id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medical_conditions: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allergies: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub surgeries: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub treatments: String,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

impl_entity!(MedicalHistory, MedicalHistories);
