//! Dashboard endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::core_state::CoreState;
use crate::models::DashboardStats;
use crate::view_state::ViewState;

/// `GET /api/dashboard` — refresh the dashboard container and return it.
pub async fn summary(State(core): State<Arc<CoreState>>) -> Json<ViewState<Option<DashboardStats>>> {
    core.dashboard.fetch(&core.token).await;
    Json(core.dashboard.snapshot())
}
