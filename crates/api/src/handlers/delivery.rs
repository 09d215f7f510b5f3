//! Patient-facing delivery confirmation links.
//!
//! Both handlers render HTML; database failures are logged and shown as a
//! generic error page.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use chrono::Utc;
use serde::Deserialize;
use woundcare_core::delivery::within_confirmation_window;
use woundcare_db::repositories::{DeliveryConfirmationRepo, OrderDeliveryConfirmationRepo};

use super::trimmed;
use crate::pages::{self, Page};
use crate::request_meta::{client_ip, user_agent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// GET /confirm-delivery?token=
///
/// Link sent in the delivery confirmation SMS.
pub async fn confirm_sms_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Page {
    let Some(token) = trimmed(query.token) else {
        return pages::missing_token();
    };
    confirm_sms_token(&state, &headers, &token)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "SMS delivery confirmation failed");
            pages::server_error()
        })
}

/// GET /patient/confirm-delivery?token=
///
/// Link sent in the delivery confirmation email.
pub async fn confirm_email_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Page {
    let Some(token) = trimmed(query.token) else {
        return pages::missing_token();
    };
    confirm_email_token(&state, &headers, &token)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Email delivery confirmation failed");
            pages::server_error()
        })
}

async fn confirm_sms_token(
    state: &AppState,
    headers: &HeaderMap,
    token: &str,
) -> Result<Page, sqlx::Error> {
    let Some(view) = DeliveryConfirmationRepo::find_view_by_token(&state.pool, token).await? else {
        return Ok(pages::unknown_link());
    };
    if view.confirmed_at.is_some() {
        return Ok(pages::already_confirmed());
    }
    if view
        .sms_sent_at
        .is_some_and(|sent| !within_confirmation_window(sent, Utc::now()))
    {
        return Ok(pages::link_expired());
    }

    let ip = client_ip(headers);
    let agent = user_agent(headers);
    if !DeliveryConfirmationRepo::confirm_web_link(&state.pool, view.id, &ip, agent.as_deref())
        .await?
    {
        return Ok(pages::already_confirmed());
    }

    tracing::info!(order_id = view.order_id, "Delivery confirmed by web link");
    Ok(pages::delivery_confirmed(&view.patient_first_name, view.order_id))
}

async fn confirm_email_token(
    state: &AppState,
    headers: &HeaderMap,
    token: &str,
) -> Result<Page, sqlx::Error> {
    let Some(view) = OrderDeliveryConfirmationRepo::find_view_by_token(&state.pool, token).await?
    else {
        return Ok(pages::unknown_link());
    };
    if view.confirmed_at.is_some() {
        return Ok(pages::already_confirmed());
    }
    if !OrderDeliveryConfirmationRepo::confirm(&state.pool, view.id, &client_ip(headers)).await? {
        return Ok(pages::already_confirmed());
    }

    tracing::info!(order_id = view.order_id, "Delivery confirmed by email link");
    let patient = format!("{} {}", view.patient_first_name, view.patient_last_name);
    let physician = format!("{} {}", view.physician_first_name, view.physician_last_name);
    Ok(pages::delivery_confirmed_with_physician(
        patient.trim(),
        physician.trim(),
        view.order_id,
    ))
}
