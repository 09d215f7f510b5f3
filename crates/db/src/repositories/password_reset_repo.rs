//! Repository for the `password_resets` table.
//!
//! Tokens are single-use: issuing a new token and completing a reset both
//! consume every outstanding token for the email inside the same transaction.

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::password_reset::{CreatePasswordReset, PasswordReset};

const COLUMNS: &str = "id, user_id, email, selector, token_hash, requested_at, expires_at, \
                       consumed_at, ip, ua";

pub struct PasswordResetRepo;

impl PasswordResetRepo {
    /// Count reset requests for `email` in the last `window_minutes`.
    pub async fn count_recent(
        pool: &PgPool,
        email: &str,
        window_minutes: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM password_resets
             WHERE email = $1 AND requested_at > NOW() - ($2::bigint * INTERVAL '1 minute')",
        )
        .bind(email)
        .bind(window_minutes)
        .fetch_one(pool)
        .await
    }

    /// Consume outstanding tokens for the email and insert a new one.
    pub async fn issue(
        pool: &PgPool,
        input: &CreatePasswordReset,
    ) -> Result<PasswordReset, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE password_resets SET consumed_at = NOW()
             WHERE email = $1 AND consumed_at IS NULL AND expires_at > NOW()",
        )
        .bind(&input.email)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO password_resets (user_id, email, selector, token_hash, expires_at, ip, ua)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let reset = sqlx::query_as::<_, PasswordReset>(&query)
            .bind(input.user_id)
            .bind(&input.email)
            .bind(&input.selector)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .bind(&input.ip)
            .bind(&input.ua)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(reset)
    }

    /// Newest unconsumed, unexpired token for a selector.
    pub async fn find_active_by_selector(
        pool: &PgPool,
        selector: &str,
    ) -> Result<Option<PasswordReset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM password_resets
             WHERE selector = $1 AND consumed_at IS NULL AND expires_at > NOW()
             ORDER BY id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PasswordReset>(&query)
            .bind(selector)
            .fetch_optional(pool)
            .await
    }

    /// Mark a single token consumed.
    pub async fn consume(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE password_resets SET consumed_at = NOW() WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the user's new password hash and consume this and every other
    /// outstanding token for the email, atomically.
    ///
    /// Returns `false` (and changes nothing) if the token was consumed concurrently.
    pub async fn complete_reset(
        pool: &PgPool,
        reset: &PasswordReset,
        user_id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let consumed = sqlx::query(
            "UPDATE password_resets SET consumed_at = NOW() WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(reset.id)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET password_hash = $2, password_updated_at = NOW(), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE password_resets SET consumed_at = NOW()
             WHERE email = $1 AND consumed_at IS NULL",
        )
        .bind(&reset.email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
