pub mod admin;
pub mod auth;
pub mod files;
pub mod health;
pub mod orders;
pub mod patients;
pub mod portal;
pub mod twilio;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                   login (public)
/// /auth/logout                                  logout
/// /auth/csrf                                    CSRF token for the session
/// /auth/request-reset                           request a reset link (public)
/// /auth/reset-password                          complete a reset (public)
///
/// /admin/orders/update-status                   status transition (superadmin)
/// /admin/orders/pending-review                  review queue (superadmin)
///
/// /orders/check-completeness                    evaluate + persist completeness
///
/// /patients/{id}/photo-requests                 request a wound photo (POST)
/// /patients/{id}/wound-photos                   list received photos (GET)
///
/// /wound-photos/{id}                            stream a wound photo
/// /files                                        sanitized upload download
///
/// /twilio/delivery-confirmation-reply           SMS reply webhook
/// /twilio/receive-mms                           inbound MMS webhook
///
/// /webhooks/carrier                             carrier shipment events
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/orders", orders::router())
        .nest("/patients", patients::router())
        .nest("/twilio", twilio::router())
        .nest("/webhooks", webhooks::router())
        .merge(files::router())
}
