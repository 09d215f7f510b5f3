//! Order entity model, review-queue projection and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use woundcare_core::completeness::CompletenessInput;
use woundcare_core::order_status::OrderStatus;
use woundcare_core::types::{DbId, Timestamp};

/// A row from the `orders` table.
///
/// `cash_price` is stored as `NUMERIC(10,2)` and read back as `float8`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub patient_id: DbId,
    pub user_id: DbId,
    pub product: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<i32>,
    pub payment_method: String,
    pub delivery_location: String,
    pub wound_location: Option<String>,
    pub icd10_primary: Option<String>,
    pub wound_length_cm: Option<f64>,
    pub wound_width_cm: Option<f64>,
    pub id_card_path: Option<String>,
    pub ins_card_path: Option<String>,
    pub aob_path: Option<String>,
    pub rx_note_path: Option<String>,
    pub sign_name: Option<String>,
    pub signed_at: Option<Timestamp>,
    pub insurance_provider: Option<String>,
    pub insurance_member_id: Option<String>,
    pub status: String,
    pub review_status: Option<String>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub reviewed_by: Option<DbId>,
    pub cash_price: Option<f64>,
    pub tracking_code: Option<String>,
    pub carrier: Option<String>,
    pub carrier_status: Option<String>,
    pub carrier_eta: Option<Timestamp>,
    pub shipped_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
    pub completeness_checked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an order.
#[derive(Debug, Default, Deserialize)]
pub struct CreateOrder {
    pub patient_id: DbId,
    pub user_id: DbId,
    pub product: Option<String>,
    pub frequency: Option<String>,
    pub duration_days: Option<i32>,
    pub payment_method: Option<String>,
    pub wound_location: Option<String>,
    pub icd10_primary: Option<String>,
    pub wound_length_cm: Option<f64>,
    pub wound_width_cm: Option<f64>,
    pub status: Option<String>,
    pub review_status: Option<String>,
    pub tracking_code: Option<String>,
}

/// Admin status transition applied by [`crate::repositories::OrderRepo::update_status`].
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order_id: DbId,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub tracking_code: Option<String>,
    pub carrier: Option<String>,
    pub cash_price: Option<f64>,
    pub changed_by: DbId,
    pub changed_by_role: String,
    /// Alert message to raise for the physician in the same transaction.
    pub physician_alert: Option<String>,
}

/// Result of a status transition.
#[derive(Debug, Clone, FromRow)]
pub struct StatusTransition {
    pub id: DbId,
    pub old_status: String,
    pub new_status: String,
}

/// One entry in the admin review queue (order joined with patient and physician).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingReviewOrder {
    pub id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub status: String,
    pub review_status: Option<String>,
    pub product: Option<String>,
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
    pub payment_method: String,
    pub delivery_location: String,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_dob: Option<NaiveDate>,
    pub physician_first_name: String,
    pub physician_last_name: String,
    pub practice_name: Option<String>,
    pub has_dme_license: bool,
}

/// Fields needed to evaluate completeness (order joined with its patient).
#[derive(Debug, Clone, FromRow)]
pub struct CompletenessRow {
    pub order_id: DbId,
    pub user_id: DbId,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_dob: Option<NaiveDate>,
    pub patient_sex: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_address: Option<String>,
    pub product: Option<String>,
    pub wound_location: Option<String>,
    pub icd10_primary: Option<String>,
    pub wound_length_cm: Option<f64>,
    pub wound_width_cm: Option<f64>,
    pub id_card_path: Option<String>,
    pub ins_card_path: Option<String>,
    pub aob_path: Option<String>,
    pub rx_note_path: Option<String>,
    pub sign_name: Option<String>,
    pub signed_at: Option<Timestamp>,
    pub payment_method: String,
    pub insurance_provider: Option<String>,
    pub insurance_member_id: Option<String>,
}

impl From<CompletenessRow> for CompletenessInput {
    fn from(row: CompletenessRow) -> Self {
        Self {
            patient_first_name: Some(row.patient_first_name),
            patient_last_name: Some(row.patient_last_name),
            patient_dob: row.patient_dob,
            patient_sex: row.patient_sex,
            patient_phone: row.patient_phone,
            patient_address: row.patient_address,
            product: row.product,
            wound_location: row.wound_location,
            icd10_primary: row.icd10_primary,
            wound_length_cm: row.wound_length_cm,
            wound_width_cm: row.wound_width_cm,
            id_card_path: row.id_card_path,
            ins_card_path: row.ins_card_path,
            aob_path: row.aob_path,
            rx_note_path: row.rx_note_path,
            sign_name: row.sign_name,
            signed_at: row.signed_at,
            payment_method: Some(row.payment_method),
            insurance_provider: row.insurance_provider,
            insurance_member_id: row.insurance_member_id,
        }
    }
}

/// Order, patient and physician details used by delivery follow-up messages.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryContext {
    pub order_id: DbId,
    pub status: String,
    pub product: Option<String>,
    pub frequency: Option<String>,
    pub delivered_at: Option<Timestamp>,
    pub patient_id: DbId,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_phone: Option<String>,
    pub patient_email: Option<String>,
    pub physician_id: DbId,
    pub physician_first_name: String,
    pub physician_last_name: String,
}
