//! Messaging provider webhooks. Form-encoded in, TwiML out.

use axum::routing::post;
use axum::Router;

use crate::handlers::twilio;
use crate::state::AppState;

/// Routes mounted at `/twilio`.
///
/// ```text
/// POST /delivery-confirmation-reply   -> delivery_confirmation_reply
/// POST /receive-mms                   -> receive_mms
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/delivery-confirmation-reply",
            post(twilio::delivery_confirmation_reply),
        )
        .route("/receive-mms", post(twilio::receive_mms))
}
