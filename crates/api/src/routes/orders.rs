use axum::routing::post;
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Routes mounted at `/orders`.
///
/// ```text
/// POST /check-completeness   -> check_completeness (owner or superadmin, CSRF)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/check-completeness", post(orders::check_completeness))
}
