use serde::{Deserialize, Serialize};

/// Stored with the same capitalised labels the gender CHECK constraint allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}
