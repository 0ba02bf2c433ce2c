use serde::{Deserialize, Serialize};

use super::enums::Gender;
use super::{impl_entity, null_as_default};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_of_birth: String,
    /// Hosted rows may carry null here; creation still requires a value.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Free text, conventionally `email | phone`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact_details: String,
}

impl_entity!(Patient, Patients);

impl Patient {
    pub fn new(name: &str, date_of_birth: &str, gender: Gender, contact_details: &str) -> Self {
        Self {
            patient_id: None,
            name: name.into(),
            date_of_birth: date_of_birth.into(),
            gender: Some(gender),
            contact_details: contact_details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_gender_decodes_as_none() {
        let row = json!({"patient_id": 4, "name": "Kim", "date_of_birth": null, "gender": null, "contact_details": null});
        let patient: Patient = serde_json::from_value(row).unwrap();
        assert_eq!(patient.gender, None);
        assert_eq!(patient.date_of_birth, "");

        let missing: Patient = serde_json::from_value(json!({"name": "Lee"})).unwrap();
        assert_eq!(missing.gender, None);
    }

    #[test]
    fn new_sets_gender() {
        let p = Patient::new("Ann", "1990-01-01", Gender::Female, "a@x.com");
        assert_eq!(serde_json::to_value(&p).unwrap()["gender"], "Female");
    }
}
