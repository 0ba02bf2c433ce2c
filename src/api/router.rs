//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::core_state::CoreState;

/// Build the API router over shared core state.
///
/// Container routes (`/:resource`) return view-state snapshots; `/data/...`
/// routes call the data-access layer directly and answer with the
/// `{data | message | error}` envelope. Static segments take priority over
/// `:resource`, so no resource may be named `health`, `navigation`,
/// `dashboard` or `data`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/navigation", get(endpoints::navigation::list))
        .route("/dashboard", get(endpoints::dashboard::summary))
        .route(
            "/:resource",
            get(endpoints::resources::list).post(endpoints::resources::create),
        )
        .route(
            "/:resource/:id",
            delete(endpoints::resources::remove),
        )
        .route("/data/dashboard", get(endpoints::data::dashboard))
        .route(
            "/data/:resource",
            get(endpoints::data::list).post(endpoints::data::create),
        )
        .route("/data/:resource/:id", delete(endpoints::data::remove))
        .with_state(core);

    Router::new()
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
}
