//! Repository for `delivery_confirmations` (SMS link and keyword reply).
//!
//! Every confirming UPDATE is guarded by `confirmed_at IS NULL` so a
//! delivery is confirmed at most once.

use sqlx::PgPool;
use woundcare_core::delivery::{METHOD_SMS_REPLY, METHOD_WEB_LINK};
use woundcare_core::types::DbId;

use crate::models::delivery_confirmation::{DeliveryConfirmation, SmsConfirmationView};

const COLUMNS: &str = "id, order_id, patient_phone, patient_email, confirmation_token, \
    sms_sent_at, sms_status, sms_sid, confirmed_at, confirmation_method, sms_reply_text, \
    confirmed_ip, confirmed_user_agent, notes, created_at, updated_at";

/// DTO for creating an SMS confirmation row.
#[derive(Debug)]
pub struct CreateDeliveryConfirmation {
    pub order_id: DbId,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub confirmation_token: String,
    pub notes: Option<String>,
}

pub struct DeliveryConfirmationRepo;

impl DeliveryConfirmationRepo {
    /// Insert a confirmation row unless one already exists for the order.
    /// Returns `None` when the order already has one.
    pub async fn create_if_absent(
        pool: &PgPool,
        input: &CreateDeliveryConfirmation,
    ) -> Result<Option<DeliveryConfirmation>, sqlx::Error> {
        let query = format!(
            "INSERT INTO delivery_confirmations
                (order_id, patient_phone, patient_email, confirmation_token, notes)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_delivery_confirmations_order DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeliveryConfirmation>(&query)
            .bind(input.order_id)
            .bind(&input.patient_phone)
            .bind(&input.patient_email)
            .bind(&input.confirmation_token)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<DeliveryConfirmation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM delivery_confirmations WHERE order_id = $1");
        sqlx::query_as::<_, DeliveryConfirmation>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Record a successful SMS send.
    pub async fn record_sms_sent(
        pool: &PgPool,
        id: DbId,
        sms_sid: &str,
        sms_status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE delivery_confirmations
             SET sms_sent_at = NOW(), sms_sid = $2, sms_status = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(sms_sid)
        .bind(sms_status)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed SMS send in `notes`.
    pub async fn record_sms_failure(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE delivery_confirmations
             SET sms_status = 'failed', notes = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Look up a confirmation by its web-link token, with the patient's first name.
    pub async fn find_view_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<SmsConfirmationView>, sqlx::Error> {
        sqlx::query_as::<_, SmsConfirmationView>(
            "SELECT dc.id, dc.order_id, dc.sms_sent_at, dc.confirmed_at,
                    p.first_name AS patient_first_name
             FROM delivery_confirmations dc
             JOIN orders o ON o.id = dc.order_id
             JOIN patients p ON p.id = o.patient_id
             WHERE dc.confirmation_token = $1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Confirm through the web link. Returns `false` if already confirmed.
    pub async fn confirm_web_link(
        pool: &PgPool,
        id: DbId,
        ip: &str,
        user_agent: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE delivery_confirmations
             SET confirmed_at = NOW(), confirmation_method = $2, confirmed_ip = $3,
                 confirmed_user_agent = $4, updated_at = NOW()
             WHERE id = $1 AND confirmed_at IS NULL",
        )
        .bind(id)
        .bind(METHOD_WEB_LINK)
        .bind(ip)
        .bind(user_agent)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recent unconfirmed confirmation whose SMS went to one of `phones`
    /// within the last `window_days`.
    pub async fn find_pending_for_phones(
        pool: &PgPool,
        phones: &[String],
        window_days: i64,
    ) -> Result<Option<DeliveryConfirmation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM delivery_confirmations
             WHERE patient_phone = ANY($1)
               AND confirmed_at IS NULL
               AND sms_sent_at IS NOT NULL
               AND sms_sent_at > NOW() - ($2::bigint * INTERVAL '1 day')
             ORDER BY sms_sent_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, DeliveryConfirmation>(&query)
            .bind(phones)
            .bind(window_days)
            .fetch_optional(pool)
            .await
    }

    /// Most recent unconfirmed confirmation for any of the patient's orders
    /// whose SMS was sent within the last `window_days`.
    pub async fn find_pending_for_patient(
        pool: &PgPool,
        patient_id: DbId,
        window_days: i64,
    ) -> Result<Option<DeliveryConfirmation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM delivery_confirmations
             WHERE order_id IN (SELECT id FROM orders WHERE patient_id = $1)
               AND confirmed_at IS NULL
               AND sms_sent_at IS NOT NULL
               AND sms_sent_at > NOW() - ($2::bigint * INTERVAL '1 day')
             ORDER BY sms_sent_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, DeliveryConfirmation>(&query)
            .bind(patient_id)
            .bind(window_days)
            .fetch_optional(pool)
            .await
    }

    /// Confirm through an SMS keyword reply. Returns `false` if already confirmed.
    pub async fn confirm_sms_reply(
        pool: &PgPool,
        id: DbId,
        reply_text: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE delivery_confirmations
             SET confirmed_at = NOW(), confirmation_method = $2, sms_reply_text = $3,
                 updated_at = NOW()
             WHERE id = $1 AND confirmed_at IS NULL",
        )
        .bind(id)
        .bind(METHOD_SMS_REPLY)
        .bind(reply_text)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
