//! Route definitions for the `/admin` resource (superadmin only).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST /orders/update-status    -> update_status (CSRF)
/// GET  /orders/pending-review   -> pending_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/update-status", post(orders::update_status))
        .route("/orders/pending-review", get(orders::pending_review))
}
