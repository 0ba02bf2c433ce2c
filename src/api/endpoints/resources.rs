//! Collection endpoints, one route set shared by every resource.
//!
//! - `GET /api/:resource` — refetch the container, return its snapshot
//! - `POST /api/:resource` — container `add`
//! - `DELETE /api/:resource/:id` — container `delete`

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::db::Resource;
use crate::services::{added_message, deleted_message, DataAccess};

/// Binds `$c` to the typed container for `$resource` and evaluates `$body`.
macro_rules! with_container {
    ($core:expr, $resource:expr, $c:ident => $body:expr) => {
        match $resource {
            Resource::Patients => { let $c = &$core.patients; $body }
            Resource::Doctors => { let $c = &$core.doctors; $body }
            Resource::Appointments => { let $c = &$core.appointments; $body }
            Resource::Billings => { let $c = &$core.billings; $body }
            Resource::Insurance => { let $c = &$core.insurance; $body }
            Resource::MedicalHistories => { let $c = &$core.medical_histories; $body }
            Resource::Medications => { let $c = &$core.medications; $body }
            Resource::DiagnosticTestResults => { let $c = &$core.diagnostic_tests; $body }
        }
    };
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: Option<String>,
}

impl MutationResponse {
    fn outcome(result: Result<(), String>, ok: StatusCode, message: String) -> (StatusCode, Json<Self>) {
        match result {
            Ok(()) => (ok, Json(Self { success: true, message: Some(message), error: None })),
            Err(error) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(Self { success: false, message: None, error: Some(error) }),
            ),
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `GET /api/:resource`
pub async fn list(
    State(core): State<Arc<CoreState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let resource = DataAccess::resource_named(&name)?;
    with_container!(core, resource, c => {
        c.fetch(&core.token).await;
        to_json(c.snapshot())
    })
}

/// `POST /api/:resource`
pub async fn create(
    State(core): State<Arc<CoreState>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let resource = DataAccess::resource_named(&name)?;
    let result = with_container!(core, resource, c => {
        let record = serde_json::from_value(body).map_err(|e| {
            ApiError::BadRequest(format!("Invalid {} record: {e}", resource.label()))
        })?;
        c.add(&record, &core.token).await
    });

    Ok(MutationResponse::outcome(result, StatusCode::CREATED, added_message(resource)))
}

/// `DELETE /api/:resource/:id`
pub async fn remove(
    State(core): State<Arc<CoreState>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let resource = DataAccess::resource_named(&name)?;
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid ID format".into()))?;

    let result = with_container!(core, resource, c => c.delete(id, &core.token).await);

    Ok(MutationResponse::outcome(result, StatusCode::OK, deleted_message(resource)))
}
