use std::sync::Arc;

use woundcare_notify::email::Mailer;
use woundcare_notify::sms::SmsGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: woundcare_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Outbound SMS / MMS media provider.
    pub sms: Arc<dyn SmsGateway>,
    /// Outbound email; `None` when SMTP is not configured.
    pub mailer: Option<Arc<dyn Mailer>>,
}
