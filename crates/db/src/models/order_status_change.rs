//! Order status audit rows.

use serde::Serialize;
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

/// A row from the `order_status_changes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderStatusChange {
    pub id: DbId,
    pub order_id: DbId,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_by: Option<DbId>,
    pub changed_by_role: Option<String>,
    pub notes: Option<String>,
    pub tracking_code: Option<String>,
    pub carrier: Option<String>,
    pub changed_at: Timestamp,
    pub notification_sent_at: Option<Timestamp>,
}

/// A shipped/delivered change waiting to be reported to the ordering physician.
#[derive(Debug, Clone, FromRow)]
pub struct PendingPhysicianUpdate {
    pub change_id: DbId,
    pub order_id: DbId,
    pub new_status: String,
    pub tracking_code: Option<String>,
    pub carrier: Option<String>,
    pub product: Option<String>,
    pub physician_id: DbId,
    pub physician_email: String,
    pub physician_first_name: String,
    pub physician_last_name: String,
    pub patient_first_name: String,
    pub patient_last_name: String,
}
