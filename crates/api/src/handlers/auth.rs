//! Handlers for the `/auth` resource (login, logout, CSRF token).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use woundcare_core::error::CoreError;
use woundcare_core::reset_token::normalize_email;
use woundcare_db::models::user::UserResponse;
use woundcare_db::repositories::UserRepo;

use crate::auth::jwt::{generate_csrf_token, generate_session_token};
use crate::auth::password::verify_password;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response. The session itself travels in the cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Sets the `wc_session` cookie and
/// returns the user with the session's CSRF token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = normalize_email(&input.email);
    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let csrf_token = generate_csrf_token();
    let token = generate_session_token(user.id, &user.role, &csrf_token, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    let cookie = session_cookie(&token, state.config.jwt.session_max_age_secs());

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            user: UserResponse::from(&user),
            csrf_token,
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Clears the session cookie. Sessions are stateless, so nothing is revoked
/// server-side.
pub async fn logout() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(SET_COOKIE, clear_session_cookie())])
}

/// GET /api/v1/auth/csrf
pub async fn csrf(user: AuthUser) -> Json<CsrfResponse> {
    Json(CsrfResponse {
        csrf_token: user.csrf,
    })
}
