//! Per-entity view state: the current list, a loading flag and the last
//! error message, mutated only through the data-access layer.
//!
//! Rules shared by every container:
//! - Operations on one container run one at a time. Callers share a
//!   container (one per resource behind the HTTP surface), so a queued call
//!   waits for the running one instead of interleaving with it.
//! - `fetch` sets `loading` as soon as it is called and clears the error once
//!   it runs. `loading` stays set while any fetch is queued or running; a
//!   drop guard releases each one, even for dropped futures.
//! - `add`/`delete` clear the previous error when they run, refetch on
//!   success, and return their own failure message.
//! - Lists are only ever replaced wholesale from a fetch.
//! - Nothing is committed once the caller's [`ViewToken`] is cancelled.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::models::{
    Appointment, Billing, DashboardStats, DiagnosticTestResult, Doctor, Entity, Insurance,
    MedicalHistory, Medication, Patient,
};
use crate::services::{DataAccess, DataError};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState<D> {
    pub data: D,
    pub loading: bool,
    pub error: Option<String>,
}

/// Liveness flag for whoever is displaying a container. Results that
/// arrive after `cancel()` are dropped instead of written.
#[derive(Debug, Clone)]
pub struct ViewToken {
    live: Arc<AtomicBool>,
}

impl ViewToken {
    pub fn new() -> Self {
        Self { live: Arc::new(AtomicBool::new(true)) }
    }

    pub fn cancel(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Default for ViewToken {
    fn default() -> Self {
        Self::new()
    }
}

struct StateCell<D> {
    state: RwLock<ViewState<D>>,
    /// Fetches started and not yet finished. Only changed under the write lock.
    pending: AtomicUsize,
    /// Held for the whole of each fetch, add or delete.
    op: Mutex<()>,
}

impl<D: Clone + Default> StateCell<D> {
    fn new() -> Self {
        Self {
            state: RwLock::new(ViewState::default()),
            pending: AtomicUsize::new(0),
            op: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> ViewState<D> {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut ViewState<D>)) {
        match self.state.write() {
            Ok(mut guard) => f(&mut *guard),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
    }

    fn commit(&self, token: &ViewToken, f: impl FnOnce(&mut ViewState<D>)) {
        if token.is_live() {
            self.update(f);
        } else {
            tracing::debug!("View no longer live, result discarded");
        }
    }

    /// Count one more fetch in flight and return the guard that releases it.
    fn begin_loading(&self, token: &ViewToken) -> LoadingGuard<'_, D> {
        let live = token.is_live();
        self.update(|s| {
            self.pending.fetch_add(1, Ordering::SeqCst);
            if live {
                s.loading = true;
            }
        });
        LoadingGuard { cell: self }
    }
}

struct LoadingGuard<'a, D: Clone + Default> {
    cell: &'a StateCell<D>,
}

impl<D: Clone + Default> Drop for LoadingGuard<'_, D> {
    fn drop(&mut self) {
        let cell = self.cell;
        cell.update(|s| {
            let left = cell.pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            s.loading = left > 0;
        });
    }
}

/// View state for one entity list.
pub struct Container<T: Entity> {
    access: DataAccess,
    cell: StateCell<Vec<T>>,
}

impl<T: Entity> Container<T> {
    pub fn new(access: DataAccess) -> Self {
        Self { access, cell: StateCell::new() }
    }

    pub fn snapshot(&self) -> ViewState<Vec<T>> {
        self.cell.snapshot()
    }

    pub async fn fetch(&self, token: &ViewToken) {
        let _loading = self.cell.begin_loading(token);
        let _op = self.cell.op.lock().await;
        self.load(token).await;
    }

    /// Create the record, then refetch. On failure returns the message that
    /// was recorded as the container error.
    pub async fn add(&self, record: &T, token: &ViewToken) -> Result<(), String> {
        let _op = self.cell.op.lock().await;
        self.cell.commit(token, |s| s.error = None);
        match self.access.create(record).await {
            Ok(_) => {
                let _loading = self.cell.begin_loading(token);
                self.load(token).await;
                Ok(())
            }
            Err(err) => Err(self.record_error(token, "add", err)),
        }
    }

    /// Delete by identifier, then refetch. On failure returns the message
    /// that was recorded as the container error.
    pub async fn delete(&self, id: i64, token: &ViewToken) -> Result<(), String> {
        let _op = self.cell.op.lock().await;
        self.cell.commit(token, |s| s.error = None);
        match self.access.remove::<T>(id).await {
            Ok(()) => {
                let _loading = self.cell.begin_loading(token);
                self.load(token).await;
                Ok(())
            }
            Err(err) => Err(self.record_error(token, "delete", err)),
        }
    }

    /// Fetch and commit. The caller holds `op` and a loading guard.
    async fn load(&self, token: &ViewToken) {
        self.cell.commit(token, |s| s.error = None);
        match self.access.fetch_all::<T>().await {
            Ok(items) => self.cell.commit(token, |s| s.data = items),
            Err(err) => {
                self.record_error(token, "fetch", err);
            }
        }
    }

    fn record_error(&self, token: &ViewToken, op: &str, err: DataError) -> String {
        tracing::warn!(resource = %T::RESOURCE, op, error = %err, "View state operation failed");
        let message = err.to_string();
        self.cell.commit(token, |s| s.error = Some(message.clone()));
        message
    }
}

pub type PatientsState = Container<Patient>;
pub type DoctorsState = Container<Doctor>;
pub type AppointmentsState = Container<Appointment>;
pub type BillingsState = Container<Billing>;
pub type InsuranceState = Container<Insurance>;
pub type MedicalHistoriesState = Container<MedicalHistory>;
pub type MedicationsState = Container<Medication>;
pub type DiagnosticTestsState = Container<DiagnosticTestResult>;

/// View state for the dashboard summary. `None` until the first fetch lands.
pub struct DashboardState {
    access: DataAccess,
    cell: StateCell<Option<DashboardStats>>,
}

impl DashboardState {
    pub fn new(access: DataAccess) -> Self {
        Self { access, cell: StateCell::new() }
    }

    pub fn snapshot(&self) -> ViewState<Option<DashboardStats>> {
        self.cell.snapshot()
    }

    pub async fn fetch(&self, token: &ViewToken) {
        self.fetch_at(token, Utc::now()).await;
    }

    pub async fn fetch_at(&self, token: &ViewToken, now: DateTime<Utc>) {
        let _loading = self.cell.begin_loading(token);
        let _op = self.cell.op.lock().await;
        self.cell.commit(token, |s| s.error = None);
        match self.access.get_dashboard_stats(now).await {
            Ok(stats) => self.cell.commit(token, |s| s.data = Some(stats)),
            Err(err) => {
                tracing::warn!(error = %err, "Dashboard fetch failed");
                self.cell.commit(token, |s| s.error = Some(err.to_string()));
            }
        }
    }
}
