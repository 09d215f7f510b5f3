//! Repository for the `order_alerts` table.

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::order_alert::OrderAlert;

const COLUMNS: &str = "id, order_id, alert_type, message, severity, recipient_role, is_read, \
                       read_at, created_at";

pub struct OrderAlertRepo;

impl OrderAlertRepo {
    /// Alerts raised for an order, newest first.
    pub async fn list_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<OrderAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM order_alerts WHERE order_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, OrderAlert>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }
}
