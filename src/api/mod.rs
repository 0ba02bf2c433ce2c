//! HTTP surface.
//!
//! Exposes the view-state containers as JSON endpoints nested under `/api/`.
//! `api_router()` returns a plain `Router` that can be mounted on any axum
//! server; `server::start_server` runs it with graceful shutdown.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession};
