//! Wound photo rows.

use serde::Serialize;
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

pub const UPLOADED_VIA_SMS: &str = "sms";
pub const UPLOADED_VIA_PORTAL: &str = "portal";

/// A row from the `wound_photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WoundPhoto {
    pub id: DbId,
    pub patient_id: DbId,
    pub order_id: Option<DbId>,
    pub photo_request_id: Option<DbId>,
    pub uploaded_via: String,
    pub photo_path: String,
    pub photo_mime: String,
    pub photo_size_bytes: i64,
    pub patient_notes: Option<String>,
    pub from_phone: Option<String>,
    pub reviewed: bool,
    pub reviewed_at: Option<Timestamp>,
    pub uploaded_at: Timestamp,
}

/// DTO for recording a stored photo.
#[derive(Debug)]
pub struct CreateWoundPhoto {
    pub patient_id: DbId,
    pub uploaded_via: &'static str,
    pub photo_path: String,
    pub photo_mime: String,
    pub photo_size_bytes: i64,
    pub patient_notes: Option<String>,
    pub from_phone: Option<String>,
}

/// A photo together with the physician who owns its patient (for access checks).
#[derive(Debug, Clone, FromRow)]
pub struct WoundPhotoAccess {
    pub id: DbId,
    pub photo_path: String,
    pub photo_mime: String,
    pub physician_id: DbId,
}
