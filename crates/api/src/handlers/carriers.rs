//! Shipment status webhook for carrier integrations.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use woundcare_core::carrier::{clean_tracking, order_status_for_event};
use woundcare_core::error::CoreError;
use woundcare_core::hashing::constant_time_str_eq;
use woundcare_core::order_status::OrderStatus;
use woundcare_core::types::{DbId, Timestamp};
use woundcare_db::repositories::order_repo::CarrierEvent;
use woundcare_db::repositories::OrderRepo;

use super::trimmed;
use crate::error::{AppError, AppResult};
use crate::services::delivery::follow_up_after_delivery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebhookAuth {
    pub secret: Option<String>,
}

/// Body posted by a carrier integration.
#[derive(Debug, Deserialize)]
pub struct CarrierWebhookRequest {
    pub carrier: Option<String>,
    pub tracking: Option<String>,
    pub status: Option<String>,
    pub eta: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct CarrierWebhookResponse {
    pub success: bool,
    pub order_id: DbId,
    pub status: String,
    pub status_changed: bool,
}

/// POST /api/v1/webhooks/carrier?secret=
///
/// Stores the raw carrier status on the order carrying the tracking code and
/// moves the order to `shipped` / `delivered` when the event implies it.
pub async fn carrier_event(
    State(state): State<AppState>,
    Query(auth): Query<WebhookAuth>,
    Json(input): Json<CarrierWebhookRequest>,
) -> AppResult<Json<CarrierWebhookResponse>> {
    let Some(expected) = state.config.carrier_webhook_secret.as_deref() else {
        return Err(AppError::ServiceUnavailable(
            "Carrier webhook is not configured".into(),
        ));
    };
    let presented = auth.secret.unwrap_or_default();
    if !constant_time_str_eq(&presented, expected) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook secret".into(),
        )));
    }

    let (Some(carrier), Some(tracking)) = (trimmed(input.carrier), trimmed(input.tracking))
    else {
        return Err(AppError::BadRequest(
            "carrier and tracking are required".into(),
        ));
    };
    let carrier_status = trimmed(input.status)
        .unwrap_or_default()
        .to_ascii_lowercase();

    let event = CarrierEvent {
        tracking_code: clean_tracking(&tracking),
        carrier: carrier.to_ascii_lowercase(),
        new_status: order_status_for_event(&carrier_status),
        carrier_status,
        eta: input.eta,
        delivered_at: input.delivered_at,
    };

    let applied = OrderRepo::apply_carrier_event(&state.pool, &event)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No order with tracking {}", event.tracking_code)))?;

    let changed = applied.old_status != applied.new_status;
    tracing::info!(
        order_id = applied.id,
        carrier = %event.carrier,
        carrier_status = %event.carrier_status,
        old_status = %applied.old_status,
        new_status = %applied.new_status,
        "Carrier event applied",
    );

    if changed && applied.new_status == OrderStatus::Delivered.as_str() {
        follow_up_after_delivery(&state, applied.id).await;
    }

    Ok(Json(CarrierWebhookResponse {
        success: true,
        order_id: applied.id,
        status: applied.new_status,
        status_changed: changed,
    }))
}
