use serde::{Deserialize, Serialize};

use super::{Appointment, Patient};

/// Summary shown on the landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: u64,
    pub total_doctors: u64,
    pub total_appointments: u64,
    pub today_appointments: u64,
    pub recent_patients: Vec<Patient>,
    pub upcoming_appointments: Vec<Appointment>,
}
