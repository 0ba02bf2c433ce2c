use serde::{Deserialize, Serialize};

use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coverage_details: String,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

impl_entity!(Insurance, Insurance);
