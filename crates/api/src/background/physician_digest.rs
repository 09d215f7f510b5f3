//! Daily shipment digest for ordering physicians.
//!
//! Collects the last day's `shipped` / `delivered` transitions that have not
//! been reported yet and emails one summary per physician. Rows are stamped
//! only after their physician's email was accepted.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use woundcare_core::carrier::{self, tracking_url};
use woundcare_core::types::DbId;
use woundcare_db::models::order_status_change::PendingPhysicianUpdate;
use woundcare_db::repositories::OrderStatusChangeRepo;
use woundcare_notify::email::Mailer;
use woundcare_notify::templates::{self, DigestLine};

use crate::state::AppState;

/// Look-back window for status changes.
const DIGEST_WINDOW_HOURS: i32 = 24;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DigestSummary {
    pub physicians: usize,
    pub emails_sent: usize,
    pub changes_marked: u64,
}

/// Run the digest loop until `cancel` is triggered.
pub async fn run(state: AppState, cancel: CancellationToken) {
    let period = Duration::from_secs(state.config.digest_interval_secs);
    tracing::info!(interval_secs = period.as_secs(), "Physician digest job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Physician digest job stopping");
                break;
            }
            _ = interval.tick() => {
                match send_digest_once(&state).await {
                    Ok(summary) => {
                        tracing::info!(
                            physicians = summary.physicians,
                            emails_sent = summary.emails_sent,
                            changes_marked = summary.changes_marked,
                            "Physician digest job: run complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Physician digest job failed");
                    }
                }
            }
        }
    }
}

/// Send one digest per physician with unreported changes.
///
/// Without a configured mailer nothing is sent and nothing is stamped.
pub async fn send_digest_once(state: &AppState) -> Result<DigestSummary, sqlx::Error> {
    let Some(mailer) = state.mailer.as_ref() else {
        tracing::debug!("Physician digest skipped: no mailer configured");
        return Ok(DigestSummary::default());
    };

    let updates =
        OrderStatusChangeRepo::list_pending_physician_updates(&state.pool, DIGEST_WINDOW_HOURS)
            .await?;

    let mut summary = DigestSummary::default();
    for group in group_by_physician(&updates) {
        summary.physicians += 1;
        if send_physician_digest(mailer.as_ref(), group).await {
            summary.emails_sent += 1;
            let ids: Vec<DbId> = group.iter().map(|u| u.change_id).collect();
            summary.changes_marked += OrderStatusChangeRepo::mark_notified(&state.pool, &ids).await?;
        }
    }
    Ok(summary)
}

/// Split rows (already ordered by physician) into per-physician runs.
fn group_by_physician(updates: &[PendingPhysicianUpdate]) -> Vec<&[PendingPhysicianUpdate]> {
    updates
        .chunk_by(|a, b| a.physician_id == b.physician_id)
        .collect()
}

async fn send_physician_digest(mailer: &dyn Mailer, group: &[PendingPhysicianUpdate]) -> bool {
    let Some(first) = group.first() else {
        return false;
    };

    let lines: Vec<DigestLine> = group
        .iter()
        .map(|u| DigestLine {
            order_id: u.order_id,
            patient_name: format!("{} {}", u.patient_first_name, u.patient_last_name),
            product: u.product.clone(),
            status: u.new_status.clone(),
            tracking: u.tracking_code.as_deref().map(|code| {
                let carrier = u.carrier.as_deref().and_then(carrier::Carrier::from_str_db);
                format!("{code} ({})", tracking_url(code, carrier))
            }),
        })
        .collect();

    let message =
        templates::physician_digest_email(&first.physician_email, &first.physician_last_name, &lines);
    match mailer.send(&message).await {
        Ok(()) => {
            tracing::info!(
                physician_id = first.physician_id,
                updates = lines.len(),
                "Physician digest sent"
            );
            true
        }
        Err(e) => {
            tracing::warn!(physician_id = first.physician_id, error = %e, "Physician digest failed");
            false
        }
    }
}
