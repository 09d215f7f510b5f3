//! Repository for the `orders` table, its status audit trail and alerts.

use sqlx::PgPool;
use woundcare_core::completeness::Completeness;
use woundcare_core::order_status::{
    OrderStatus, ALERT_CASH_PRICE_REQUIRED, REVIEW_PENDING_ADMIN, REVIEW_UNDER_REVIEW,
    SEVERITY_CRITICAL,
};
use woundcare_core::roles::ALERT_RECIPIENT_PHYSICIAN;
use woundcare_core::types::{DbId, Timestamp};

use crate::models::order::{
    CompletenessRow, CreateOrder, DeliveryContext, Order, PendingReviewOrder, StatusTransition,
    StatusUpdate,
};

/// Column list shared across queries. `cash_price` is NUMERIC in the table.
const COLUMNS: &str = "id, patient_id, user_id, product, frequency, duration_days, payment_method, \
    delivery_location, wound_location, icd10_primary, wound_length_cm, wound_width_cm, \
    id_card_path, ins_card_path, aob_path, rx_note_path, sign_name, signed_at, \
    insurance_provider, insurance_member_id, status, review_status, review_notes, reviewed_at, \
    reviewed_by, cash_price::float8 AS cash_price, tracking_code, carrier, carrier_status, \
    carrier_eta, shipped_at, delivered_at, is_complete, missing_fields, completeness_checked_at, \
    created_at, updated_at";

/// Order joined with patient and physician, for delivery follow-up.
const DELIVERY_CONTEXT_SELECT: &str = "SELECT o.id AS order_id, o.status, o.product, o.frequency, \
    o.delivered_at, p.id AS patient_id, p.first_name AS patient_first_name, \
    p.last_name AS patient_last_name, p.phone AS patient_phone, p.email AS patient_email, \
    u.id AS physician_id, u.first_name AS physician_first_name, \
    u.last_name AS physician_last_name \
    FROM orders o \
    JOIN patients p ON p.id = o.patient_id \
    JOIN users u ON u.id = o.user_id";

/// A shipment event reported by a carrier.
#[derive(Debug, Clone)]
pub struct CarrierEvent {
    pub tracking_code: String,
    pub carrier: String,
    pub carrier_status: String,
    pub eta: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    /// Order status the event maps to, if any.
    pub new_status: Option<OrderStatus>,
}

pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order. Used by seed scripts and tests; the intake form is not part of this service.
    pub async fn create(pool: &PgPool, input: &CreateOrder) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (patient_id, user_id, product, frequency, duration_days,
                payment_method, wound_location, icd10_primary, wound_length_cm, wound_width_cm,
                status, review_status, tracking_code)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'insurance'), $7, $8, $9, $10,
                COALESCE($11, 'submitted'), $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(input.patient_id)
            .bind(input.user_id)
            .bind(&input.product)
            .bind(&input.frequency)
            .bind(input.duration_days)
            .bind(&input.payment_method)
            .bind(&input.wound_location)
            .bind(&input.icd10_primary)
            .bind(input.wound_length_cm)
            .bind(input.wound_width_cm)
            .bind(&input.status)
            .bind(&input.review_status)
            .bind(&input.tracking_code)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply an admin status transition.
    ///
    /// In one transaction: lock the order, update status and review fields,
    /// record an `order_status_changes` row and, when requested, raise a
    /// critical physician alert. Returns `None` when the order does not exist.
    pub async fn update_status(
        pool: &PgPool,
        update: &StatusUpdate,
    ) -> Result<Option<StatusTransition>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let old_status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(update.order_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(old_status) = old_status else {
            return Ok(None);
        };

        let new_status = update.status.as_str();
        sqlx::query(
            "UPDATE orders SET
                status = $2,
                reviewed_at = NOW(),
                reviewed_by = $3,
                review_notes = COALESCE($4, review_notes),
                tracking_code = COALESCE($5, tracking_code),
                carrier = CASE WHEN $5::text IS NOT NULL THEN $6 ELSE carrier END,
                cash_price = COALESCE($7::float8::numeric(10, 2), cash_price),
                shipped_at = CASE WHEN $2 = 'shipped' AND shipped_at IS NULL
                                  THEN NOW() ELSE shipped_at END,
                delivered_at = CASE WHEN $2 = 'delivered' AND delivered_at IS NULL
                                    THEN NOW() ELSE delivered_at END,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(update.order_id)
        .bind(new_status)
        .bind(update.changed_by)
        .bind(&update.notes)
        .bind(&update.tracking_code)
        .bind(&update.carrier)
        .bind(update.cash_price)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO order_status_changes
                (order_id, old_status, new_status, changed_by, changed_by_role, notes,
                 tracking_code, carrier)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(update.order_id)
        .bind(&old_status)
        .bind(new_status)
        .bind(update.changed_by)
        .bind(&update.changed_by_role)
        .bind(&update.notes)
        .bind(&update.tracking_code)
        .bind(&update.carrier)
        .execute(&mut *tx)
        .await?;

        if let Some(message) = &update.physician_alert {
            sqlx::query(
                "INSERT INTO order_alerts (order_id, alert_type, message, severity, recipient_role)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(update.order_id)
            .bind(ALERT_CASH_PRICE_REQUIRED)
            .bind(message)
            .bind(SEVERITY_CRITICAL)
            .bind(ALERT_RECIPIENT_PHYSICIAN)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(StatusTransition {
            id: update.order_id,
            old_status,
            new_status: new_status.to_string(),
        }))
    }

    /// Orders awaiting admin review, newest first.
    pub async fn list_pending_review(
        pool: &PgPool,
    ) -> Result<Vec<PendingReviewOrder>, sqlx::Error> {
        sqlx::query_as::<_, PendingReviewOrder>(
            "SELECT o.id, o.created_at, o.updated_at, o.status, o.review_status, o.product,
                    o.is_complete, o.missing_fields, o.payment_method, o.delivery_location,
                    p.first_name AS patient_first_name, p.last_name AS patient_last_name,
                    p.dob AS patient_dob,
                    u.first_name AS physician_first_name, u.last_name AS physician_last_name,
                    u.practice_name, u.has_dme_license
             FROM orders o
             JOIN patients p ON p.id = o.patient_id
             JOIN users u ON u.id = o.user_id
             WHERE o.review_status IN ($1, $2)
                OR (o.status IN ('submitted', 'under_review') AND o.review_status IS NULL)
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .bind(REVIEW_PENDING_ADMIN)
        .bind(REVIEW_UNDER_REVIEW)
        .fetch_all(pool)
        .await
    }

    /// Load the fields the completeness evaluator needs.
    pub async fn completeness_row(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<CompletenessRow>, sqlx::Error> {
        sqlx::query_as::<_, CompletenessRow>(
            "SELECT o.id AS order_id, o.user_id,
                    p.first_name AS patient_first_name, p.last_name AS patient_last_name,
                    p.dob AS patient_dob, p.sex AS patient_sex, p.phone AS patient_phone,
                    p.address AS patient_address,
                    o.product, o.wound_location, o.icd10_primary, o.wound_length_cm,
                    o.wound_width_cm, o.id_card_path, o.ins_card_path, o.aob_path,
                    o.rx_note_path, o.sign_name, o.signed_at, o.payment_method,
                    o.insurance_provider, o.insurance_member_id
             FROM orders o
             JOIN patients p ON p.id = o.patient_id
             WHERE o.id = $1",
        )
        .bind(order_id)
        .fetch_optional(pool)
        .await
    }

    /// Persist a completeness evaluation. Returns `true` if the order exists.
    pub async fn save_completeness(
        pool: &PgPool,
        order_id: DbId,
        result: &Completeness,
    ) -> Result<bool, sqlx::Error> {
        let outcome = sqlx::query(
            "UPDATE orders SET is_complete = $2, missing_fields = $3,
                    completeness_checked_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(order_id)
        .bind(result.is_complete)
        .bind(&result.missing_fields)
        .execute(pool)
        .await?;
        Ok(outcome.rows_affected() > 0)
    }

    /// Order, patient and physician details for delivery follow-up.
    pub async fn delivery_context(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<DeliveryContext>, sqlx::Error> {
        let query = format!("{DELIVERY_CONTEXT_SELECT} WHERE o.id = $1");
        sqlx::query_as::<_, DeliveryContext>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Delivered orders still missing an SMS confirmation (patient has a
    /// phone) or a photo-prompt schedule, oldest delivery first.
    pub async fn list_delivered_needing_follow_up(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<DeliveryContext>, sqlx::Error> {
        let query = format!(
            "{DELIVERY_CONTEXT_SELECT}
             WHERE o.status = 'delivered'
               AND (
                    (COALESCE(p.phone, '') <> ''
                     AND NOT EXISTS (SELECT 1 FROM delivery_confirmations dc
                                     WHERE dc.order_id = o.id))
                 OR NOT EXISTS (SELECT 1 FROM photo_prompt_schedules s
                                WHERE s.order_id = o.id)
               )
             ORDER BY o.delivered_at ASC NULLS LAST, o.id ASC
             LIMIT $1"
        );
        sqlx::query_as::<_, DeliveryContext>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Apply a carrier shipment event to the order carrying `tracking_code`.
    ///
    /// The raw carrier status and ETA are always stored. The order status only
    /// changes when the event maps to a status, the order is not already
    /// `delivered`, and the status differs; such changes are audited with
    /// `changed_by_role = 'carrier'`. Returns `None` for unknown tracking codes.
    pub async fn apply_carrier_event(
        pool: &PgPool,
        event: &CarrierEvent,
    ) -> Result<Option<StatusTransition>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(DbId, String)> = sqlx::query_as(
            "SELECT id, status FROM orders
             WHERE UPPER(REPLACE(tracking_code, ' ', '')) = UPPER(REPLACE($1, ' ', ''))
             ORDER BY id DESC
             LIMIT 1
             FOR UPDATE",
        )
        .bind(&event.tracking_code)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((order_id, old_status)) = current else {
            return Ok(None);
        };

        let new_status = match event.new_status {
            Some(status)
                if old_status != OrderStatus::Delivered.as_str()
                    && old_status != status.as_str() =>
            {
                Some(status)
            }
            _ => None,
        };

        sqlx::query(
            "UPDATE orders SET
                carrier = $2,
                carrier_status = $3,
                carrier_eta = COALESCE($4, carrier_eta),
                status = COALESCE($5, status),
                shipped_at = CASE WHEN $5 = 'shipped' AND shipped_at IS NULL
                                  THEN NOW() ELSE shipped_at END,
                delivered_at = CASE WHEN $5 = 'delivered' AND delivered_at IS NULL
                                    THEN COALESCE($6, NOW()) ELSE delivered_at END,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(order_id)
        .bind(&event.carrier)
        .bind(&event.carrier_status)
        .bind(event.eta)
        .bind(new_status.map(|s| s.as_str()))
        .bind(event.delivered_at)
        .execute(&mut *tx)
        .await?;

        if let Some(status) = new_status {
            sqlx::query(
                "INSERT INTO order_status_changes
                    (order_id, old_status, new_status, changed_by_role, notes, tracking_code, carrier)
                 VALUES ($1, $2, $3, 'carrier', $4, $5, $6)",
            )
            .bind(order_id)
            .bind(&old_status)
            .bind(status.as_str())
            .bind(format!("Carrier status: {}", event.carrier_status))
            .bind(&event.tracking_code)
            .bind(&event.carrier)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        let new_status = new_status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| old_status.clone());
        Ok(Some(StatusTransition {
            id: order_id,
            old_status,
            new_status,
        }))
    }
}
