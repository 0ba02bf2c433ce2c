//! Sidebar route table.

use serde::Serialize;

use crate::db::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    /// Backing collection, `None` for the dashboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

const fn item(label: &'static str, path: &'static str, resource: Option<Resource>) -> NavItem {
    NavItem { label, path, resource }
}

pub static NAV_ITEMS: [NavItem; 9] = [
    item("Dashboard", "/", None),
    item("Patients", "/patients", Some(Resource::Patients)),
    item("Doctors", "/doctors", Some(Resource::Doctors)),
    item("Appointments", "/appointments", Some(Resource::Appointments)),
    item("Billing", "/billing", Some(Resource::Billings)),
    item("Medical History", "/medical-history", Some(Resource::MedicalHistories)),
    item("Insurance", "/insurance", Some(Resource::Insurance)),
    item("Medications", "/medications", Some(Resource::Medications)),
    item("Diagnostic Tests", "/diagnostic-tests", Some(Resource::DiagnosticTestResults)),
];
