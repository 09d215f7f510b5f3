//! Patient- and physician-facing HTML pages served at the root.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use woundcare_core::media::MAX_PHOTO_BYTES;

use crate::handlers::{delivery, password_reset, upload};
use crate::state::AppState;

/// Headroom for multipart framing and the `notes` field on top of the photo.
const UPLOAD_BODY_OVERHEAD: usize = 1024 * 1024;

/// Root-level page routes.
///
/// ```text
/// GET  /portal/forgot                      -> forgot_page
/// GET  /portal/reset?selector&token        -> reset_page
/// GET  /confirm-delivery?token=            -> confirm_sms_link
/// GET  /patient/confirm-delivery?token=    -> confirm_email_link
/// GET  /upload/{token}                     -> upload_form
/// POST /upload/{token}                     -> submit_upload (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portal/forgot", get(password_reset::forgot_page))
        .route("/portal/reset", get(password_reset::reset_page))
        .route("/confirm-delivery", get(delivery::confirm_sms_link))
        .route("/patient/confirm-delivery", get(delivery::confirm_email_link))
        .route(
            "/upload/{token}",
            get(upload::upload_form)
                .post(upload::submit_upload)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + UPLOAD_BODY_OVERHEAD)),
        )
}
