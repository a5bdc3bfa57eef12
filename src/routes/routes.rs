//! Defines routes for the metadata registry.
//!
//! ## Structure
//! - **Editor endpoints**
//!   - `GET      /`      : list entries (supports `?delete=<entity id>`)
//!   - `GET|POST /edit`  : open the editing form, or save it when `submit` is posted
//!   - `GET      /import`: paste a parsed descriptor to start a new entry
//!
//! - **Probes**
//!   - `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        editor_handlers::{edit_metadata, import_metadata, list_metadata},
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{Router, routing::get};

/// Build and return the router for the editor and probe routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Editor routes
        .route("/", get(list_metadata))
        .route("/edit", get(edit_metadata).post(edit_metadata))
        .route("/import", get(import_metadata))
}
