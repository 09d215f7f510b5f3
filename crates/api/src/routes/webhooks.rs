use axum::routing::post;
use axum::Router;

use crate::handlers::carriers;
use crate::state::AppState;

/// Routes mounted at `/webhooks` (shared-secret auth).
///
/// ```text
/// POST /carrier?secret=   -> carrier_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/carrier", post(carriers::carrier_event))
}
