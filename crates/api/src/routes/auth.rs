//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, password_reset};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login            -> login
/// POST /logout           -> logout
/// GET  /csrf             -> csrf (requires auth)
/// POST /request-reset    -> request_reset (public, always 200)
/// POST /reset-password   -> reset_password (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/csrf", get(auth::csrf))
        .route("/request-reset", post(password_reset::request_reset))
        .route("/reset-password", post(password_reset::reset_password))
}
