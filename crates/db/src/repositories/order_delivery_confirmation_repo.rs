//! Repository for `order_delivery_confirmations` (emailed link).

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::delivery_confirmation::{EmailConfirmationView, OrderDeliveryConfirmation};

const COLUMNS: &str = "id, order_id, patient_email, confirmation_token, sent_at, confirmed_at, \
                       confirmed_ip, created_at";

pub struct OrderDeliveryConfirmationRepo;

impl OrderDeliveryConfirmationRepo {
    /// Insert a row unless the order already has one. Returns `None` in that case.
    pub async fn create_if_absent(
        pool: &PgPool,
        order_id: DbId,
        patient_email: &str,
        confirmation_token: &str,
    ) -> Result<Option<OrderDeliveryConfirmation>, sqlx::Error> {
        let query = format!(
            "INSERT INTO order_delivery_confirmations (order_id, patient_email, confirmation_token)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_order_delivery_confirmations_order DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrderDeliveryConfirmation>(&query)
            .bind(order_id)
            .bind(patient_email)
            .bind(confirmation_token)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<OrderDeliveryConfirmation>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM order_delivery_confirmations WHERE order_id = $1");
        sqlx::query_as::<_, OrderDeliveryConfirmation>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a confirmation by token with patient and physician names.
    pub async fn find_view_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<EmailConfirmationView>, sqlx::Error> {
        sqlx::query_as::<_, EmailConfirmationView>(
            "SELECT odc.id, odc.order_id, odc.confirmed_at,
                    p.first_name AS patient_first_name, p.last_name AS patient_last_name,
                    u.first_name AS physician_first_name, u.last_name AS physician_last_name
             FROM order_delivery_confirmations odc
             JOIN orders o ON o.id = odc.order_id
             JOIN patients p ON p.id = o.patient_id
             JOIN users u ON u.id = o.user_id
             WHERE odc.confirmation_token = $1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Mark confirmed. Returns `false` if it was already confirmed.
    pub async fn confirm(pool: &PgPool, id: DbId, ip: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE order_delivery_confirmations SET confirmed_at = NOW(), confirmed_ip = $2
             WHERE id = $1 AND confirmed_at IS NULL",
        )
        .bind(id)
        .bind(ip)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
