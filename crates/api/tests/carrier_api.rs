//! Integration tests for the carrier shipment webhook.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, post_json};
use sqlx::PgPool;
use woundcare_api::router::build_app_router;
use woundcare_api::state::AppState;
use woundcare_db::models::order::{CreateOrder, Order};
use woundcare_db::repositories::{DeliveryConfirmationRepo, OrderRepo, OrderStatusChangeRepo};

const TRACKING: &str = "1Z999AA10123456784";

fn webhook_uri(secret: &str) -> String {
    format!("/api/v1/webhooks/carrier?secret={secret}")
}

async fn setup(pool: PgPool, status: &str) -> (common::TestApp, Order) {
    let doc = common::create_user(&pool, "doc@example.com", "physician").await;
    let patient = common::create_patient(&pool, doc.id, Some("5551234567")).await;
    let order = common::create_order(
        &pool,
        &patient,
        CreateOrder {
            status: Some(status.into()),
            tracking_code: Some(TRACKING.into()),
            ..Default::default()
        },
    )
    .await;
    (common::build_test_app(pool), order)
}

// ---------------------------------------------------------------------------
// Authentication and validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_or_missing_secret_is_unauthorized(pool: PgPool) {
    let (t, _order) = setup(pool, "approved").await;
    let body = serde_json::json!({ "carrier": "ups", "tracking": TRACKING, "status": "delivered" });

    let wrong = post_json(t.app(), &webhook_uri("guess"), body.clone()).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let missing = post_json(t.app(), "/api/v1/webhooks/carrier", body).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert!(t.sms.sent().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unconfigured_secret_disables_webhook(pool: PgPool) {
    let (t, _order) = setup(pool, "approved").await;
    let mut config = common::test_config(t.uploads.path());
    config.carrier_webhook_secret = None;
    let state = AppState {
        config: Arc::new(config.clone()),
        ..t.state.clone()
    };
    let app = build_app_router(state, &config);

    let response = post_json(
        app,
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({ "carrier": "ups", "tracking": TRACKING, "status": "delivered" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn carrier_and_tracking_are_required(pool: PgPool) {
    let (t, _order) = setup(pool, "approved").await;

    let response = post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({ "carrier": "ups", "tracking": "  ", "status": "delivered" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_tracking_is_not_found(pool: PgPool) {
    let (t, _order) = setup(pool, "approved").await;

    let response = post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({ "carrier": "fedex", "tracking": "123456789012", "status": "in_transit" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn in_transit_marks_order_shipped(pool: PgPool) {
    let (t, order) = setup(pool.clone(), "approved").await;

    let response = post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({
            "carrier": "UPS",
            "tracking": "1z999aa1 0123456784",
            "status": "IN_TRANSIT",
            "eta": "2026-10-20T17:00:00Z",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["order_id"], order.id);
    assert_eq!(json["status"], "shipped");
    assert_eq!(json["status_changed"], true);

    let stored = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "shipped");
    assert_eq!(stored.carrier.as_deref(), Some("ups"));
    assert_eq!(stored.carrier_status.as_deref(), Some("in_transit"));
    assert!(stored.carrier_eta.is_some());
    assert!(stored.shipped_at.is_some());

    let history = OrderStatusChangeRepo::list_for_order(&pool, order.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].changed_by_role.as_deref(), Some("carrier"));
    assert!(history[0].changed_by.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unmapped_status_is_stored_without_transition(pool: PgPool) {
    let (t, order) = setup(pool.clone(), "approved").await;

    let response = post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({ "carrier": "ups", "tracking": TRACKING, "status": "label_created" }),
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["status"], "approved");
    assert_eq!(json["status_changed"], false);

    let stored = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.carrier_status.as_deref(), Some("label_created"));
    assert!(OrderStatusChangeRepo::list_for_order(&pool, order.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delivered_event_starts_follow_up_and_is_never_reverted(pool: PgPool) {
    let (t, order) = setup(pool.clone(), "shipped").await;

    let delivered = post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({
            "carrier": "ups",
            "tracking": TRACKING,
            "status": "delivered",
            "delivered_at": "2026-10-15T14:30:00Z",
        }),
    )
    .await;
    assert_eq!(body_json(delivered).await["status_changed"], true);

    let stored = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "delivered");
    assert_eq!(
        stored.delivered_at.unwrap().to_rfc3339(),
        "2026-10-15T14:30:00+00:00"
    );
    assert_eq!(t.sms.sent().len(), 1);
    assert!(DeliveryConfirmationRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .is_some());

    // A late scan must not move a delivered order back to shipped.
    let late = post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({ "carrier": "ups", "tracking": TRACKING, "status": "out_for_delivery" }),
    )
    .await;
    let json = body_json(late).await;
    assert_eq!(json["status"], "delivered");
    assert_eq!(json["status_changed"], false);

    // Repeated delivered events do not message the patient again.
    post_json(
        t.app(),
        &webhook_uri(common::CARRIER_SECRET),
        serde_json::json!({ "carrier": "ups", "tracking": TRACKING, "status": "delivered" }),
    )
    .await;
    assert_eq!(t.sms.sent().len(), 1);
}
