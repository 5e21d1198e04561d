//! HTTP control surface assembly, `spec.md` §6.
//!
//! Route layout and the `TraceLayer` span-per-request setup are grounded in
//! `csa-mcp-hub::serve` from the `RyderFreeman4Logos-cli-sub-agent` example
//! pack, the closest axum usage in the whole corpus; the teacher repo itself
//! has no HTTP surface to imitate directly.

pub mod handlers;
pub mod models;

use crate::registry::Registry;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full router, wired to `registry` as shared Axum state.
pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/run", post(handlers::run_process))
        .route("/stdin/:identifier", post(handlers::send_stdin))
        .route("/inspect/:identifier", get(handlers::inspect))
        .route("/tail/stdout/:identifier", get(handlers::tail_stdout))
        .route("/tail/stderr/:identifier", get(handlers::tail_stderr))
        .route("/stdout/:identifier", get(handlers::read_stdout))
        .route("/stderr/:identifier", get(handlers::read_stderr))
        .route("/terminate/:identifier", delete(handlers::terminate))
        .route("/processes", get(handlers::list_processes))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}
