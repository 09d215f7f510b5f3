//! Integration tests for the selector/verifier password reset tables.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use woundcare_core::reset_token;
use woundcare_db::models::password_reset::CreatePasswordReset;
use woundcare_db::models::user::CreateUser;
use woundcare_db::repositories::{PasswordResetRepo, UserRepo};

fn new_reset(user_id: Option<i64>, email: &str) -> (CreatePasswordReset, String) {
    let token = reset_token::generate();
    let input = CreatePasswordReset {
        user_id,
        email: email.to_string(),
        selector: token.selector.clone(),
        token_hash: token.verifier_hash.clone(),
        expires_at: Utc::now() + Duration::minutes(reset_token::TOKEN_TTL_MINUTES),
        ip: Some("203.0.113.9".to_string()),
        ua: None,
    };
    (input, token.selector)
}

async fn seed_user(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: "Doc@Example.com".to_string(),
            password_hash: "old-hash".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: "physician".to_string(),
            practice_name: None,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn issuing_consumes_outstanding_tokens(pool: PgPool) {
    let user_id = seed_user(&pool).await;

    let (first, first_selector) = new_reset(Some(user_id), "doc@example.com");
    PasswordResetRepo::issue(&pool, &first).await.unwrap();
    let (second, second_selector) = new_reset(Some(user_id), "doc@example.com");
    PasswordResetRepo::issue(&pool, &second).await.unwrap();

    assert!(PasswordResetRepo::find_active_by_selector(&pool, &first_selector)
        .await
        .unwrap()
        .is_none());
    assert!(PasswordResetRepo::find_active_by_selector(&pool, &second_selector)
        .await
        .unwrap()
        .is_some());
    assert_eq!(
        PasswordResetRepo::count_recent(&pool, "doc@example.com", 60).await.unwrap(),
        2
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_tokens_are_not_active(pool: PgPool) {
    let (mut input, selector) = new_reset(None, "nobody@example.com");
    input.expires_at = Utc::now() - Duration::minutes(1);
    PasswordResetRepo::issue(&pool, &input).await.unwrap();

    assert!(PasswordResetRepo::find_active_by_selector(&pool, &selector)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completing_a_reset_updates_password_once(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let (input, selector) = new_reset(Some(user_id), "doc@example.com");
    PasswordResetRepo::issue(&pool, &input).await.unwrap();

    let reset = PasswordResetRepo::find_active_by_selector(&pool, &selector)
        .await
        .unwrap()
        .unwrap();
    assert!(PasswordResetRepo::complete_reset(&pool, &reset, user_id, "new-hash")
        .await
        .unwrap());

    let user = UserRepo::find_by_email(&pool, "DOC@example.com").await.unwrap().unwrap();
    assert_eq!(user.password_hash, "new-hash");
    assert!(user.password_updated_at.is_some());

    // A second use of the same row changes nothing.
    assert!(!PasswordResetRepo::complete_reset(&pool, &reset, user_id, "other-hash")
        .await
        .unwrap());
    let user = UserRepo::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(user.password_hash, "new-hash");
}
