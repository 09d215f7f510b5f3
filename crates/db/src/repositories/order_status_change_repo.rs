//! Repository for the `order_status_changes` audit trail.

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::order_status_change::{OrderStatusChange, PendingPhysicianUpdate};

const COLUMNS: &str = "id, order_id, old_status, new_status, changed_by, changed_by_role, notes, \
                       tracking_code, carrier, changed_at, notification_sent_at";

pub struct OrderStatusChangeRepo;

impl OrderStatusChangeRepo {
    /// Status history for an order, oldest first.
    pub async fn list_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<OrderStatusChange>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM order_status_changes
             WHERE order_id = $1
             ORDER BY changed_at ASC, id ASC"
        );
        sqlx::query_as::<_, OrderStatusChange>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Shipped / delivered transitions in the last `window_hours` that have
    /// not been reported to the ordering physician yet, grouped by physician.
    pub async fn list_pending_physician_updates(
        pool: &PgPool,
        window_hours: i32,
    ) -> Result<Vec<PendingPhysicianUpdate>, sqlx::Error> {
        sqlx::query_as::<_, PendingPhysicianUpdate>(
            "SELECT c.id AS change_id, c.order_id, c.new_status, c.tracking_code, c.carrier,
                    o.product,
                    u.id AS physician_id, u.email AS physician_email,
                    u.first_name AS physician_first_name, u.last_name AS physician_last_name,
                    p.first_name AS patient_first_name, p.last_name AS patient_last_name
             FROM order_status_changes c
             JOIN orders o ON o.id = c.order_id
             JOIN users u ON u.id = o.user_id
             JOIN patients p ON p.id = o.patient_id
             WHERE c.new_status IN ('shipped', 'delivered')
               AND c.notification_sent_at IS NULL
               AND c.changed_at > NOW() - ($1::int * INTERVAL '1 hour')
             ORDER BY u.id ASC, c.changed_at ASC, c.id ASC",
        )
        .bind(window_hours)
        .fetch_all(pool)
        .await
    }

    /// Stamp `notification_sent_at` on the given rows. Returns the number updated.
    pub async fn mark_notified(pool: &PgPool, change_ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE order_status_changes SET notification_sent_at = NOW()
             WHERE id = ANY($1) AND notification_sent_at IS NULL",
        )
        .bind(change_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
