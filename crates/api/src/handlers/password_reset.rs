//! Self-service password reset: request a link, confirm with a new password,
//! and the two HTML pages that drive those endpoints.
//!
//! Reset links use a selector/verifier split token. The selector locates the
//! row; only the SHA-256 of the verifier is stored and it is compared in
//! constant time.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use woundcare_core::reset_token::{
    self, decode_verifier, is_rate_limited, is_valid_email, normalize_email,
    RATE_LIMIT_WINDOW_MINUTES, TOKEN_TTL_MINUTES,
};
use woundcare_db::models::password_reset::CreatePasswordReset;
use woundcare_db::repositories::{PasswordResetRepo, UserRepo};
use woundcare_notify::templates;

use super::trimmed;
use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::pages::{self, Page};
use crate::request_meta::{client_ip, user_agent};
use crate::response::OkResponse;
use crate::state::AppState;

const INVALID_LINK: &str = "Invalid or expired link";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RequestResetInput {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordInput {
    pub selector: Option<String>,
    pub token: Option<String>,
    pub password: Option<String>,
    pub confirm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPageQuery {
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/request-reset
///
/// Always answers `{"ok": true}` so the response never reveals whether an
/// account exists, whether the caller was rate limited or whether anything
/// failed. A body that is not a JSON object (or has the wrong content type)
/// counts as a request without an email.
pub async fn request_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    input: Result<Json<RequestResetInput>, JsonRejection>,
) -> Json<OkResponse> {
    let input = match input {
        Ok(Json(input)) => input,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable reset request body");
            RequestResetInput { email: None }
        }
    };
    let email = normalize_email(input.email.as_deref().unwrap_or_default());
    if let Err(e) = issue_reset(&state, &headers, &email).await {
        tracing::error!(error = %e, "Password reset request failed");
    }
    Json(OkResponse::ok())
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<Json<OkResponse>> {
    let (Some(selector), Some(token), Some(password)) = (
        trimmed(input.selector),
        trimmed(input.token),
        input.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest("Missing required fields".into()));
    };

    if input.confirm.as_deref().is_some_and(|c| c != password) {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }
    validate_password_strength(&password, MIN_PASSWORD_LENGTH).map_err(AppError::BadRequest)?;

    let verifier =
        decode_verifier(&token).ok_or_else(|| AppError::BadRequest(INVALID_LINK.into()))?;
    let reset = PasswordResetRepo::find_active_by_selector(&state.pool, &selector)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_LINK.into()))?;
    if !reset_token::verify(&verifier, &reset.token_hash) {
        tracing::warn!(reset_id = reset.id, "Password reset verifier mismatch");
        return Err(AppError::BadRequest(INVALID_LINK.into()));
    }

    let user = match reset.user_id {
        Some(user_id) => UserRepo::find_by_id(&state.pool, user_id).await?,
        None => None,
    };
    let user = match user {
        Some(user) => Some(user),
        None => UserRepo::find_by_email(&state.pool, &reset.email).await?,
    };
    let Some(user) = user else {
        PasswordResetRepo::consume(&state.pool, reset.id).await?;
        return Err(AppError::BadRequest("Account not found".into()));
    };

    let password_hash = hash_password(&password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    if !PasswordResetRepo::complete_reset(&state.pool, &reset, user.id, &password_hash).await? {
        return Err(AppError::BadRequest(INVALID_LINK.into()));
    }

    tracing::info!(user_id = user.id, "Password reset completed");
    Ok(Json(OkResponse::ok()))
}

/// GET /portal/forgot
pub async fn forgot_page() -> Page {
    pages::forgot_password()
}

/// GET /portal/reset?selector=..&token=..
pub async fn reset_page(Query(query): Query<ResetPageQuery>) -> Page {
    pages::reset_password(&query.selector, &query.token)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn issue_reset(state: &AppState, headers: &HeaderMap, email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Ok(());
    }

    let recent = PasswordResetRepo::count_recent(&state.pool, email, RATE_LIMIT_WINDOW_MINUTES)
        .await?;
    if is_rate_limited(recent) {
        tracing::warn!(recent, "Password reset rate limit reached");
        return Ok(());
    }

    let user = UserRepo::find_by_email(&state.pool, email).await?;
    let token = reset_token::generate();
    PasswordResetRepo::issue(
        &state.pool,
        &CreatePasswordReset {
            user_id: user.as_ref().map(|u| u.id),
            email: email.to_string(),
            selector: token.selector.clone(),
            token_hash: token.verifier_hash.clone(),
            expires_at: Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES),
            ip: Some(client_ip(headers)),
            ua: user_agent(headers),
        },
    )
    .await?;

    let (Some(user), Some(mailer)) = (user.filter(|u| u.is_active), state.mailer.as_ref()) else {
        return Ok(());
    };
    let url = format!(
        "{}/portal/reset?selector={}&token={}",
        state.config.public_base_url, token.selector, token.verifier
    );
    let message = templates::password_reset_email(email, &user.first_name, &url, TOKEN_TTL_MINUTES);
    if let Err(e) = mailer.send(&message).await {
        tracing::warn!(user_id = user.id, error = %e, "Password reset email failed");
    } else {
        tracing::info!(user_id = user.id, "Password reset email sent");
    }
    Ok(())
}
