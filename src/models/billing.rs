use serde::{Deserialize, Serialize};

use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_id: Option<i64>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_date: String,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
}

impl_entity!(Billing, Billings);
