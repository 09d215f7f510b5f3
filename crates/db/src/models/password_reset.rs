//! Password reset token rows.

use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

/// A row from the `password_resets` table. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub email: String,
    pub selector: String,
    pub token_hash: String,
    pub requested_at: Timestamp,
    pub expires_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
    pub ip: Option<String>,
    pub ua: Option<String>,
}

/// DTO for issuing a new reset token.
#[derive(Debug)]
pub struct CreatePasswordReset {
    pub user_id: Option<DbId>,
    pub email: String,
    pub selector: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub ip: Option<String>,
    pub ua: Option<String>,
}
