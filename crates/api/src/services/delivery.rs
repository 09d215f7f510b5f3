//! Follow-up for orders that reached `delivered`.
//!
//! Triggered by the admin status update, the carrier webhook and the
//! background sweep. Every step is idempotent: confirmation rows and the
//! prompt schedule are created at most once per order, so re-running the
//! follow-up never messages a patient twice.

use chrono::Utc;
use woundcare_core::delivery::{
    email_confirmation_url, generate_confirmation_token, sms_confirmation_url,
};
use woundcare_core::phone::{mask, normalize_e164};
use woundcare_core::photo_prompt;
use woundcare_core::reset_token::is_valid_email;
use woundcare_core::types::DbId;
use woundcare_db::models::order::DeliveryContext;
use woundcare_db::repositories::delivery_confirmation_repo::CreateDeliveryConfirmation;
use woundcare_db::repositories::{
    DeliveryConfirmationRepo, OrderDeliveryConfirmationRepo, OrderRepo, PhotoPromptScheduleRepo,
};
use woundcare_notify::templates;

use crate::state::AppState;

/// Stored in `notes` when the patient's phone cannot be normalized.
const INVALID_PHONE_NOTE: &str = "Invalid phone number";

/// What a follow-up run actually did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FollowUpOutcome {
    pub sms_sent: bool,
    pub email_sent: bool,
    pub schedule_created: bool,
}

/// Run the follow-up for one order. Returns `None` if the order does not exist.
pub async fn follow_up_order(
    state: &AppState,
    order_id: DbId,
) -> Result<Option<FollowUpOutcome>, sqlx::Error> {
    match OrderRepo::delivery_context(&state.pool, order_id).await? {
        Some(ctx) => follow_up(state, &ctx).await.map(Some),
        None => Ok(None),
    }
}

/// Run the follow-up for an order whose delivery context is already loaded.
pub async fn follow_up(
    state: &AppState,
    ctx: &DeliveryContext,
) -> Result<FollowUpOutcome, sqlx::Error> {
    let outcome = FollowUpOutcome {
        sms_sent: send_sms_confirmation(state, ctx).await?,
        email_sent: send_email_confirmation(state, ctx).await?,
        schedule_created: ensure_photo_schedule(state, ctx).await?,
    };
    tracing::info!(
        order_id = ctx.order_id,
        sms_sent = outcome.sms_sent,
        email_sent = outcome.email_sent,
        schedule_created = outcome.schedule_created,
        "Delivery follow-up complete",
    );
    Ok(outcome)
}

/// Log-and-continue wrapper used after a status change has been committed.
pub async fn follow_up_after_delivery(state: &AppState, order_id: DbId) {
    if let Err(e) = follow_up_order(state, order_id).await {
        tracing::error!(order_id, error = %e, "Delivery follow-up failed");
    }
}

async fn send_sms_confirmation(
    state: &AppState,
    ctx: &DeliveryContext,
) -> Result<bool, sqlx::Error> {
    let Some(raw_phone) = ctx
        .patient_phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    else {
        return Ok(false);
    };

    let normalized = normalize_e164(raw_phone);
    let token = generate_confirmation_token();
    let input = CreateDeliveryConfirmation {
        order_id: ctx.order_id,
        patient_phone: normalized
            .clone()
            .unwrap_or_else(|| raw_phone.to_string()),
        patient_email: ctx.patient_email.clone(),
        confirmation_token: token.clone(),
        notes: normalized
            .is_none()
            .then(|| INVALID_PHONE_NOTE.to_string()),
    };

    let Some(row) = DeliveryConfirmationRepo::create_if_absent(&state.pool, &input).await? else {
        return Ok(false);
    };
    let Some(phone) = normalized else {
        tracing::warn!(
            order_id = ctx.order_id,
            phone = %mask(raw_phone),
            "Skipping delivery confirmation SMS: phone cannot be normalized",
        );
        return Ok(false);
    };

    let url = sms_confirmation_url(&state.config.public_base_url, &token);
    let body = templates::delivery_confirmation_sms(&ctx.patient_first_name, ctx.order_id, &url);
    match state.sms.send_sms(&phone, &body).await {
        Ok(receipt) => {
            DeliveryConfirmationRepo::record_sms_sent(
                &state.pool,
                row.id,
                &receipt.sid,
                &receipt.status,
            )
            .await?;
            tracing::info!(
                order_id = ctx.order_id,
                phone = %mask(&phone),
                sid = %receipt.sid,
                "Delivery confirmation SMS sent",
            );
            Ok(true)
        }
        Err(e) => {
            tracing::warn!(order_id = ctx.order_id, error = %e, "Delivery confirmation SMS failed");
            DeliveryConfirmationRepo::record_sms_failure(&state.pool, row.id, &e.to_string())
                .await?;
            Ok(false)
        }
    }
}

async fn send_email_confirmation(
    state: &AppState,
    ctx: &DeliveryContext,
) -> Result<bool, sqlx::Error> {
    let Some(mailer) = state.mailer.as_ref() else {
        return Ok(false);
    };
    let Some(email) = ctx
        .patient_email
        .as_deref()
        .map(str::trim)
        .filter(|e| is_valid_email(e))
    else {
        return Ok(false);
    };

    let token = generate_confirmation_token();
    let Some(row) =
        OrderDeliveryConfirmationRepo::create_if_absent(&state.pool, ctx.order_id, email, &token)
            .await?
    else {
        return Ok(false);
    };

    let url = email_confirmation_url(&state.config.public_base_url, &row.confirmation_token);
    let physician_name = format!("{} {}", ctx.physician_first_name, ctx.physician_last_name);
    let message = templates::delivery_confirmation_email(
        email,
        &ctx.patient_first_name,
        physician_name.trim(),
        ctx.order_id,
        &url,
    );
    match mailer.send(&message).await {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::warn!(order_id = ctx.order_id, error = %e, "Delivery confirmation email failed");
            Ok(false)
        }
    }
}

async fn ensure_photo_schedule(
    state: &AppState,
    ctx: &DeliveryContext,
) -> Result<bool, sqlx::Error> {
    let delivered_on = ctx.delivered_at.unwrap_or_else(Utc::now).date_naive();
    let plan = photo_prompt::plan(
        ctx.frequency.as_deref(),
        ctx.product.as_deref().unwrap_or_default(),
        delivered_on,
    );
    let created =
        PhotoPromptScheduleRepo::create_if_absent(&state.pool, ctx.order_id, ctx.patient_id, &plan)
            .await?;
    Ok(created.is_some())
}
