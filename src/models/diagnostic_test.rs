use serde::{Deserialize, Serialize};

use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticTestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic_test_result_id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_taken: String,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

impl_entity!(DiagnosticTestResult, DiagnosticTestResults);
