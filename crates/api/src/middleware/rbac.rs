//! Role gate for the admin review endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use woundcare_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Superadmin session; any other role is a 403.
pub struct RequireSuperadmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireSuperadmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_superadmin() {
            tracing::warn!(user_id = user.user_id, role = %user.role, "Non-admin hit admin endpoint");
            return Err(CoreError::Forbidden("Superadmin role required".into()).into());
        }
        Ok(RequireSuperadmin(user))
    }
}
