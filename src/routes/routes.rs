//! Defines routes for the file-sharing gateway.
//!
//! ## Structure
//! - **API endpoints**
//!   - `POST /upload` — multipart upload, answers one signed URL per file
//!   - `GET  /files`  — bucket listing with a signed URL per object
//!
//! - **Probes**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness (checks the storage backend)
//!
//! Every other path falls through to the prebuilt frontend assets; a
//! missing asset (or a missing frontend directory) answers 404.

use crate::{
    handlers::{
        file_handlers::{list_files, upload_files},
        health_handlers::{healthz, readyz},
    },
    services::storage_service::SharedStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build and return the router for the gateway.
///
/// The router carries shared state (`SharedStore`) to all handlers.
/// `frontend_dir` is only read lazily, per request, by the fallback.
pub fn routes(frontend_dir: &str) -> Router<SharedStore> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // API routes
        .route("/upload", post(upload_files))
        .route("/files", get(list_files))
        // Static frontend fallback
        .fallback_service(ServeDir::new(frontend_dir))
        // Uploads are buffered whole in memory; the only cap is the
        // per-request file count, so lift axum's default body limit.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
}
