//! Handlers for order review: status transitions, the admin review queue
//! and the completeness check.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use woundcare_core::carrier::{self, clean_tracking};
use woundcare_core::completeness::evaluate;
use woundcare_core::error::CoreError;
use woundcare_core::order_status::{
    cash_price_alert_message, validate_cash_price, OrderStatus,
};
use woundcare_core::types::DbId;
use woundcare_db::models::order::{PendingReviewOrder, StatusUpdate};
use woundcare_db::repositories::OrderRepo;

use super::trimmed;
use crate::error::{AppError, AppResult};
use crate::middleware::csrf::CsrfVerified;
use crate::middleware::rbac::RequireSuperadmin;
use crate::services::delivery::follow_up_after_delivery;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/orders/update-status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_id: Option<DbId>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub tracking_code: Option<String>,
    pub carrier: Option<String>,
    pub cash_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    pub order_id: DbId,
    pub new_status: String,
}

#[derive(Debug, Serialize)]
pub struct PendingReviewResponse {
    pub orders: Vec<PendingReviewOrder>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CompletenessRequest {
    pub order_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct CompletenessResponse {
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
    pub order_id: DbId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/orders/update-status
///
/// Apply a status transition, record it in the order history and, for
/// `delivered`, start the delivery follow-up once the change is committed.
pub async fn update_status(
    State(state): State<AppState>,
    RequireSuperadmin(admin): RequireSuperadmin,
    _csrf: CsrfVerified,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<UpdateStatusResponse>> {
    let order_id = input
        .order_id
        .ok_or_else(|| AppError::BadRequest("order_id is required".into()))?;
    let status_str = trimmed(input.status)
        .ok_or_else(|| AppError::BadRequest("status is required".into()))?;
    let status = OrderStatus::from_str_db(&status_str)
        .map_err(|_| AppError::BadRequest(format!("Invalid status: {status_str}")))?;

    let cash_price = input.cash_price.map(validate_cash_price).transpose()?;
    let physician_alert = if status == OrderStatus::CashPriceRequired {
        let price = cash_price.ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "cash_price is required for cash_price_required".into(),
            ))
        })?;
        Some(cash_price_alert_message(price))
    } else {
        None
    };

    let tracking_code = trimmed(input.tracking_code).map(|t| clean_tracking(&t));
    let carrier = tracking_code.as_deref().and_then(|tracking| {
        trimmed(input.carrier.clone())
            .map(|c| c.to_lowercase())
            .or_else(|| carrier::detect(tracking).map(|c| c.as_str().to_string()))
    });

    let update = StatusUpdate {
        order_id,
        status,
        notes: trimmed(input.notes),
        tracking_code,
        carrier,
        cash_price,
        changed_by: admin.user_id,
        changed_by_role: admin.role.clone(),
        physician_alert,
    };

    let transition = OrderRepo::update_status(&state.pool, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "order",
            id: order_id,
        }))?;

    tracing::info!(
        order_id,
        admin_id = admin.user_id,
        old_status = %transition.old_status,
        new_status = %transition.new_status,
        "Order status updated",
    );

    if status == OrderStatus::Delivered {
        follow_up_after_delivery(&state, order_id).await;
    }

    Ok(Json(UpdateStatusResponse {
        success: true,
        order_id,
        new_status: transition.new_status,
    }))
}

/// GET /api/v1/admin/orders/pending-review
pub async fn pending_review(
    State(state): State<AppState>,
    RequireSuperadmin(_admin): RequireSuperadmin,
) -> AppResult<Json<PendingReviewResponse>> {
    let orders = OrderRepo::list_pending_review(&state.pool).await?;
    let count = orders.len();
    Ok(Json(PendingReviewResponse { orders, count }))
}

/// POST /api/v1/orders/check-completeness
///
/// Re-evaluate the order's required fields and persist the result.
pub async fn check_completeness(
    State(state): State<AppState>,
    CsrfVerified(user): CsrfVerified,
    Json(input): Json<CompletenessRequest>,
) -> AppResult<Json<CompletenessResponse>> {
    let order_id = input
        .order_id
        .ok_or_else(|| AppError::BadRequest("order_id is required".into()))?;

    let row = OrderRepo::completeness_row(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "order",
            id: order_id,
        }))?;
    if !user.can_access(row.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this order".into(),
        )));
    }

    let result = evaluate(&row.into());
    OrderRepo::save_completeness(&state.pool, order_id, &result).await?;

    Ok(Json(CompletenessResponse {
        is_complete: result.is_complete,
        missing_fields: result.missing_fields,
        order_id,
    }))
}
