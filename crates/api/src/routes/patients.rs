//! Route definitions for per-patient photo workflows.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::patients;
use crate::state::AppState;

/// Routes mounted at `/patients`.
///
/// ```text
/// POST /{id}/photo-requests   -> create_photo_request (owner or superadmin, CSRF)
/// GET  /{id}/wound-photos     -> list_wound_photos (owner or superadmin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/photo-requests", post(patients::create_photo_request))
        .route("/{id}/wound-photos", get(patients::list_wound_photos))
}
