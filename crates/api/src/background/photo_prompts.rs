//! Scheduled wound-photo prompts.
//!
//! On every tick: deactivate schedules past their end date, then text each
//! patient whose prompt is due and record the prompt as an automated photo
//! request. A schedule only advances when the SMS was accepted, so a failed
//! send is retried on the next tick.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use woundcare_core::media::{generate_upload_token, UPLOAD_TOKEN_TTL_DAYS};
use woundcare_core::phone::{mask, normalize_e164};
use woundcare_core::photo_prompt::next_prompt_after;
use woundcare_db::models::photo_prompt_schedule::DuePrompt;
use woundcare_db::models::photo_request::{CreatePhotoRequest, REQUESTED_VIA_AUTOMATED_SMS};
use woundcare_db::repositories::PhotoPromptScheduleRepo;
use woundcare_notify::templates;

use crate::state::AppState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PromptSummary {
    pub deactivated: u64,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Run the prompt loop until `cancel` is triggered.
pub async fn run(state: AppState, cancel: CancellationToken) {
    let period = Duration::from_secs(state.config.photo_prompt_interval_secs);
    tracing::info!(interval_secs = period.as_secs(), "Photo prompt job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Photo prompt job stopping");
                break;
            }
            _ = interval.tick() => {
                let today = Utc::now().date_naive();
                match prompt_sweep_once(&state, today).await {
                    Ok(summary) => {
                        tracing::info!(
                            deactivated = summary.deactivated,
                            sent = summary.sent,
                            failed = summary.failed,
                            skipped = summary.skipped,
                            "Photo prompt job: sweep complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Photo prompt job: sweep failed");
                    }
                }
            }
        }
    }
}

/// One pass over the schedules as of `today`.
pub async fn prompt_sweep_once(
    state: &AppState,
    today: NaiveDate,
) -> Result<PromptSummary, sqlx::Error> {
    let mut summary = PromptSummary {
        deactivated: PhotoPromptScheduleRepo::deactivate_expired(&state.pool, today).await?,
        ..PromptSummary::default()
    };

    for due in PhotoPromptScheduleRepo::list_due(&state.pool, today).await? {
        let Some(phone) = due.patient_phone.as_deref().and_then(normalize_e164) else {
            tracing::warn!(
                schedule_id = due.schedule_id,
                patient_id = due.patient_id,
                "Skipping photo prompt: no valid phone"
            );
            summary.skipped += 1;
            continue;
        };

        if send_prompt(state, &due, &phone, today).await? {
            summary.sent += 1;
        } else {
            summary.failed += 1;
        }
    }
    Ok(summary)
}

async fn send_prompt(
    state: &AppState,
    due: &DuePrompt,
    phone: &str,
    today: NaiveDate,
) -> Result<bool, sqlx::Error> {
    let body = templates::photo_prompt_sms(
        &due.patient_first_name,
        Some(due.physician_last_name.as_str()),
    );
    let receipt = match state.sms.send_sms(phone, &body).await {
        Ok(receipt) => receipt,
        Err(e) => {
            tracing::warn!(
                schedule_id = due.schedule_id,
                phone = %mask(phone),
                error = %e,
                "Photo prompt SMS failed"
            );
            return Ok(false);
        }
    };

    let request = CreatePhotoRequest {
        patient_id: due.patient_id,
        physician_id: Some(due.physician_id),
        order_id: Some(due.order_id),
        requested_via: REQUESTED_VIA_AUTOMATED_SMS,
        wound_location: None,
        request_notes: None,
        upload_token: generate_upload_token(),
        token_expires_at: Utc::now() + chrono::Duration::days(UPLOAD_TOKEN_TTL_DAYS),
    };
    let next = next_prompt_after(today, due.frequency_days);
    let created = PhotoPromptScheduleRepo::record_prompt_sent(
        &state.pool,
        due.schedule_id,
        next,
        &request,
        Some(&receipt.sid),
    )
    .await?;

    tracing::info!(
        schedule_id = due.schedule_id,
        photo_request_id = created.id,
        phone = %mask(phone),
        next_prompt_date = %next,
        "Photo prompt sent"
    );
    Ok(true)
}
