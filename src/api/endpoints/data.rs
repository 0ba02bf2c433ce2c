//! Direct data-access endpoints rendered as the `{data | message | error}`
//! envelope. Nothing here touches the view-state containers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db::{Resource, Row};
use crate::models::DashboardStats;
use crate::services::{added_message, deleted_message, ApiResponse, DataAccess, DataError};

type Envelope<T> = (StatusCode, Json<ApiResponse<T>>);

fn respond<T>(result: Result<ApiResponse<T>, DataError>, ok: StatusCode) -> Envelope<T> {
    match result {
        Ok(body) => (ok, Json(body)),
        Err(err) => {
            let message = err.to_string();
            (ApiError::from(err).status(), Json(ApiResponse::error(message)))
        }
    }
}

/// `GET /api/data/:resource`
pub async fn list(State(core): State<Arc<CoreState>>, Path(name): Path<String>) -> Envelope<Vec<Row>> {
    let result = async {
        let resource = DataAccess::resource_named(&name)?;
        core.access.fetch_rows(resource).await.map(ApiResponse::data)
    };
    respond(result.await, StatusCode::OK)
}

/// `POST /api/data/:resource`
pub async fn create(
    State(core): State<Arc<CoreState>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Envelope<Row> {
    let result = async {
        let resource = DataAccess::resource_named(&name)?;
        let row = core.access.create_row(resource, body).await?;
        Ok::<_, DataError>(ApiResponse::Data { data: row, message: Some(added_message(resource)) })
    };
    respond(result.await, StatusCode::CREATED)
}

/// `DELETE /api/data/:resource/:id`
pub async fn remove(
    State(core): State<Arc<CoreState>>,
    Path((name, id)): Path<(String, String)>,
) -> Envelope<()> {
    let Ok(id) = id.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error("Invalid ID format")));
    };
    let result = async {
        let resource: Resource = DataAccess::resource_named(&name)?;
        core.access.remove_from(resource, id).await?;
        Ok::<_, DataError>(ApiResponse::message(deleted_message(resource)))
    };
    respond(result.await, StatusCode::OK)
}

/// `GET /api/data/dashboard`
pub async fn dashboard(State(core): State<Arc<CoreState>>) -> Envelope<DashboardStats> {
    let result = core.access.get_dashboard_stats(Utc::now()).await;
    respond(result.map(ApiResponse::data), StatusCode::OK)
}
