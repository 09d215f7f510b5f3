//! Order alert rows shown to physicians and admins.

use serde::Serialize;
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

/// A row from the `order_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderAlert {
    pub id: DbId,
    pub order_id: DbId,
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub recipient_role: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
