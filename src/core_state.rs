//! Shared application state.
//!
//! `CoreState` owns the data-access layer and one view-state container per
//! resource. The HTTP surface borrows it through an `Arc`.

use std::sync::Arc;

use crate::config::{AppConfig, BackendKind, ConfigError};
use crate::db::{self, BackingStore, MemoryStore, Resource, RestStore, SqliteStore, StoreError};
use crate::services::DataAccess;
use crate::view_state::{
    AppointmentsState, BillingsState, DashboardState, DiagnosticTestsState, DoctorsState,
    InsuranceState, MedicalHistoriesState, MedicationsState, PatientsState, ViewToken,
};

pub struct CoreState {
    pub access: DataAccess,
    /// Liveness of every container below. Cancelled on shutdown.
    pub token: ViewToken,
    pub dashboard: DashboardState,
    pub patients: PatientsState,
    pub doctors: DoctorsState,
    pub appointments: AppointmentsState,
    pub billings: BillingsState,
    pub insurance: InsuranceState,
    pub medical_histories: MedicalHistoriesState,
    pub medications: MedicationsState,
    pub diagnostic_tests: DiagnosticTestsState,
}

impl CoreState {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        let access = DataAccess::new(store);
        Self {
            token: ViewToken::new(),
            dashboard: DashboardState::new(access.clone()),
            patients: PatientsState::new(access.clone()),
            doctors: DoctorsState::new(access.clone()),
            appointments: AppointmentsState::new(access.clone()),
            billings: BillingsState::new(access.clone()),
            insurance: InsuranceState::new(access.clone()),
            medical_histories: MedicalHistoriesState::new(access.clone()),
            medications: MedicationsState::new(access.clone()),
            diagnostic_tests: DiagnosticTestsState::new(access.clone()),
            access,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self::new(open_store(config)?))
    }

    /// Stop committing late results into the containers.
    pub fn shutdown(&self) {
        self.token.cancel();
        tracing::info!("Core state shut down");
    }
}

/// Open the store selected by configuration.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn BackingStore>, CoreError> {
    let store: Arc<dyn BackingStore> = match config.backend {
        BackendKind::Sqlite => {
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::Io(format!("{}: {e}", parent.display())))?;
            }
            tracing::info!(path = %config.database_path.display(), "Opening SQLite store");
            Arc::new(SqliteStore::open(&config.database_path)?)
        }
        BackendKind::Memory => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        BackendKind::Rest => {
            let rest = config
                .rest
                .as_ref()
                .ok_or(ConfigError::MissingVar("MEDBOARD_REST_URL"))?;
            tracing::info!(url = %rest.base_url, "Using hosted REST store");
            Arc::new(RestStore::new(&rest.base_url, &rest.api_key, rest.timeout_secs))
        }
    };

    if config.seed_demo_data && store.count(Resource::Patients, &[])? == 0 {
        db::seed_demo_data(store.as_ref())?;
    }
    Ok(store)
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Server error: {0}")]
    Server(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn config(backend: BackendKind, path: std::path::PathBuf, seed: bool) -> AppConfig {
        AppConfig {
            backend,
            database_path: path,
            bind: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            seed_demo_data: seed,
            rest: None,
        }
    }

    #[test]
    fn sqlite_store_is_created_and_seeded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("medboard.db");
        let cfg = config(BackendKind::Sqlite, path.clone(), true);

        let store = open_store(&cfg).unwrap();
        assert_eq!(store.count(Resource::Patients, &[]).unwrap(), 3);
        drop(store);

        let store = open_store(&cfg).unwrap();
        assert_eq!(store.count(Resource::Patients, &[]).unwrap(), 3);
        assert!(path.exists());
    }

    #[test]
    fn memory_store_starts_empty_without_seed() {
        let cfg = config(BackendKind::Memory, "unused.db".into(), false);
        let store = open_store(&cfg).unwrap();
        assert_eq!(store.count(Resource::Doctors, &[]).unwrap(), 0);
    }

    #[test]
    fn rest_backend_without_settings_is_a_config_error() {
        let cfg = config(BackendKind::Rest, "unused.db".into(), false);
        assert!(matches!(open_store(&cfg), Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn shutdown_stops_commits() {
        let core = CoreState::new(Arc::new(MemoryStore::with_seed_data().unwrap()));
        core.shutdown();
        core.patients.fetch(&core.token).await;
        assert!(core.patients.snapshot().data.is_empty());
    }
}
