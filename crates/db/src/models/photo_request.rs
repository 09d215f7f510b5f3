//! Photo request rows.

use serde::Serialize;
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

pub const REQUESTED_VIA_MANUAL: &str = "manual";
pub const REQUESTED_VIA_AUTOMATED_SMS: &str = "automated_sms";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETED: &str = "completed";

/// A row from the `photo_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoRequest {
    pub id: DbId,
    pub patient_id: DbId,
    pub physician_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub requested_via: String,
    pub wound_location: Option<String>,
    pub request_notes: Option<String>,
    #[serde(skip_serializing)]
    pub upload_token: String,
    pub token_expires_at: Timestamp,
    pub status: String,
    pub sms_sid: Option<String>,
    pub sms_sent_at: Option<Timestamp>,
    pub photo_id: Option<DbId>,
    pub completed_at: Option<Timestamp>,
    pub requested_at: Timestamp,
}

/// DTO for creating a photo request.
#[derive(Debug)]
pub struct CreatePhotoRequest {
    pub patient_id: DbId,
    pub physician_id: Option<DbId>,
    pub order_id: Option<DbId>,
    pub requested_via: &'static str,
    pub wound_location: Option<String>,
    pub request_notes: Option<String>,
    pub upload_token: String,
    pub token_expires_at: Timestamp,
}
