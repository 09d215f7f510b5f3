//! CSRF protection for state-changing requests.
//!
//! The session token carries a random CSRF value; clients echo it in the
//! `X-CSRF-Token` header. `GET` and `HEAD` requests are exempt.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Method;
use woundcare_core::hashing::constant_time_str_eq;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the CSRF token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// An authenticated user whose request carried the session's CSRF token.
///
/// Unauthenticated requests are rejected with 401 before the token is checked;
/// a missing or wrong token is rejected with 419.
pub struct CsrfVerified(pub AuthUser);

impl FromRequestParts<AppState> for CsrfVerified {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if parts.method == Method::GET || parts.method == Method::HEAD {
            return Ok(CsrfVerified(user));
        }

        let presented = parts
            .headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !csrf_matches(presented, &user.csrf) {
            tracing::warn!(user_id = user.user_id, "Rejected request with invalid CSRF token");
            return Err(AppError::CsrfInvalid);
        }
        Ok(CsrfVerified(user))
    }
}

/// Constant-time comparison of a presented token with the session's token.
pub fn csrf_matches(presented: &str, expected: &str) -> bool {
    !presented.is_empty() && constant_time_str_eq(presented, expected)
}
