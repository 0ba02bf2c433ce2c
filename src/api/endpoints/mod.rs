pub mod dashboard;
pub mod data;
pub mod health;
pub mod navigation;
pub mod resources;
