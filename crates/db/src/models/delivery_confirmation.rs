//! Delivery confirmation rows for both channels.
//!
//! `delivery_confirmations` backs the SMS link and SMS keyword reply;
//! `order_delivery_confirmations` backs the emailed link.

use serde::Serialize;
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// SMS channel
// ---------------------------------------------------------------------------

/// A row from the `delivery_confirmations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeliveryConfirmation {
    pub id: DbId,
    pub order_id: DbId,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    #[serde(skip_serializing)]
    pub confirmation_token: String,
    pub sms_sent_at: Option<Timestamp>,
    pub sms_status: Option<String>,
    pub sms_sid: Option<String>,
    pub confirmed_at: Option<Timestamp>,
    pub confirmation_method: Option<String>,
    pub sms_reply_text: Option<String>,
    pub confirmed_ip: Option<String>,
    pub confirmed_user_agent: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An SMS confirmation joined with the patient it was addressed to.
#[derive(Debug, Clone, FromRow)]
pub struct SmsConfirmationView {
    pub id: DbId,
    pub order_id: DbId,
    pub sms_sent_at: Option<Timestamp>,
    pub confirmed_at: Option<Timestamp>,
    pub patient_first_name: String,
}

// ---------------------------------------------------------------------------
// Email channel
// ---------------------------------------------------------------------------

/// A row from the `order_delivery_confirmations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderDeliveryConfirmation {
    pub id: DbId,
    pub order_id: DbId,
    pub patient_email: String,
    #[serde(skip_serializing)]
    pub confirmation_token: String,
    pub sent_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
    pub confirmed_ip: Option<String>,
    pub created_at: Timestamp,
}

/// An email confirmation joined with patient and physician names.
#[derive(Debug, Clone, FromRow)]
pub struct EmailConfirmationView {
    pub id: DbId,
    pub order_id: DbId,
    pub confirmed_at: Option<Timestamp>,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub physician_first_name: String,
    pub physician_last_name: String,
}
