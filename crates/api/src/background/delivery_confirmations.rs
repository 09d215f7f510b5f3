//! Periodic follow-up sweep for delivered orders.
//!
//! Catches orders that reached `delivered` without going through the admin
//! update or the carrier webhook (or whose follow-up failed) and runs the
//! delivery follow-up for them.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use woundcare_db::repositories::OrderRepo;

use crate::services::delivery::follow_up;
use crate::state::AppState;

/// Maximum orders handled per tick.
const BATCH_SIZE: i64 = 100;

/// Counts from one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub orders: usize,
    pub sms_sent: usize,
    pub emails_sent: usize,
    pub schedules_created: usize,
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(state: AppState, cancel: CancellationToken) {
    let period = Duration::from_secs(state.config.delivery_sweep_interval_secs);
    tracing::info!(
        interval_secs = period.as_secs(),
        "Delivery confirmation sweep started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Delivery confirmation sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep_once(&state).await {
                    Ok(summary) if summary.orders > 0 => {
                        tracing::info!(
                            orders = summary.orders,
                            sms_sent = summary.sms_sent,
                            emails_sent = summary.emails_sent,
                            schedules_created = summary.schedules_created,
                            "Delivery confirmation sweep: follow-ups processed"
                        );
                    }
                    Ok(_) => tracing::debug!("Delivery confirmation sweep: nothing to do"),
                    Err(e) => {
                        tracing::error!(error = %e, "Delivery confirmation sweep failed");
                    }
                }
            }
        }
    }
}

/// Follow up every delivered order still missing a confirmation or schedule.
///
/// A failure on one order is logged and does not stop the batch.
pub async fn sweep_once(state: &AppState) -> Result<SweepSummary, sqlx::Error> {
    let pending = OrderRepo::list_delivered_needing_follow_up(&state.pool, BATCH_SIZE).await?;

    let mut summary = SweepSummary::default();
    for ctx in &pending {
        summary.orders += 1;
        match follow_up(state, ctx).await {
            Ok(outcome) => {
                summary.sms_sent += usize::from(outcome.sms_sent);
                summary.emails_sent += usize::from(outcome.email_sent);
                summary.schedules_created += usize::from(outcome.schedule_created);
            }
            Err(e) => {
                tracing::error!(order_id = ctx.order_id, error = %e, "Follow-up failed");
            }
        }
    }
    Ok(summary)
}
