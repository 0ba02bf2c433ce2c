use serde::{Deserialize, Serialize};

use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialization: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact_details: String,
}

impl_entity!(Doctor, Doctors);

impl Doctor {
    pub fn new(name: &str, specialization: &str, contact_details: &str) -> Self {
        Self {
            doctor_id: None,
            name: name.into(),
            specialization: specialization.into(),
            contact_details: contact_details.into(),
        }
    }
}
