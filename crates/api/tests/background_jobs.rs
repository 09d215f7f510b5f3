//! Integration tests for the single-pass functions behind the background jobs.

mod common;

use chrono::{Days, Utc};
use common::{login, post_json_session};
use sqlx::PgPool;
use woundcare_api::background::delivery_confirmations::sweep_once;
use woundcare_api::background::photo_prompts::prompt_sweep_once;
use woundcare_api::background::physician_digest::send_digest_once;
use woundcare_api::services::delivery::follow_up_order;
use woundcare_db::models::order::{CreateOrder, Order};
use woundcare_db::models::patient::Patient;
use woundcare_db::repositories::{
    OrderStatusChangeRepo, PhotoPromptScheduleRepo, PhotoRequestRepo,
};

async fn delivered_order(pool: &PgPool, phone: Option<&str>) -> (Patient, Order) {
    let doc = common::create_user(pool, "doc@example.com", "physician").await;
    let patient = common::create_patient(pool, doc.id, phone).await;
    let order = common::create_order(
        pool,
        &patient,
        CreateOrder {
            product: Some("Collagen Sheet 14-day kit".into()),
            frequency: Some("weekly".into()),
            status: Some("delivered".into()),
            ..Default::default()
        },
    )
    .await;
    (patient, order)
}

// ---------------------------------------------------------------------------
// Delivery follow-up sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_follows_up_missed_deliveries_once(pool: PgPool) {
    let (_patient, order) = delivered_order(&pool, Some("5551234567")).await;
    let t = common::build_test_app(pool.clone());

    let first = sweep_once(&t.state).await.unwrap();
    assert_eq!(first.orders, 1);
    assert_eq!(first.sms_sent, 1);
    assert_eq!(first.emails_sent, 1);
    assert_eq!(first.schedules_created, 1);
    assert!(t.sms.sent()[0].1.contains(&format!("order #{}", order.id)));

    let second = sweep_once(&t.state).await.unwrap();
    assert_eq!(second.orders, 0);
    assert_eq!(t.sms.sent().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_ignores_orders_not_delivered(pool: PgPool) {
    let doc = common::create_user(&pool, "doc@example.com", "physician").await;
    let patient = common::create_patient(&pool, doc.id, Some("5551234567")).await;
    common::create_order(&pool, &patient, CreateOrder::default()).await;
    let t = common::build_test_app(pool);

    let summary = sweep_once(&t.state).await.unwrap();

    assert_eq!(summary.orders, 0);
    assert!(t.sms.sent().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_without_phone_only_creates_schedule(pool: PgPool) {
    let (_patient, order) = delivered_order(&pool, None).await;
    let t = common::build_test_app_with(pool.clone(), false);

    let summary = sweep_once(&t.state).await.unwrap();

    assert_eq!(summary.orders, 1);
    assert_eq!(summary.sms_sent, 0);
    assert_eq!(summary.emails_sent, 0);
    assert_eq!(summary.schedules_created, 1);
    assert!(PhotoPromptScheduleRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .is_some());
    assert_eq!(sweep_once(&t.state).await.unwrap().orders, 0);
}

// ---------------------------------------------------------------------------
// Photo prompts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn prompt_is_sent_when_due_and_schedule_advances(pool: PgPool) {
    let (patient, order) = delivered_order(&pool, Some("5551234567")).await;
    let t = common::build_test_app(pool.clone());
    follow_up_order(&t.state, order.id).await.unwrap();
    let schedule = PhotoPromptScheduleRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    let today = Utc::now().date_naive();
    assert_eq!(schedule.next_prompt_date, today + Days::new(2));
    assert_eq!(schedule.frequency_days, 7);

    let early = prompt_sweep_once(&t.state, today).await.unwrap();
    assert_eq!(early.sent, 0);

    let due_day = schedule.next_prompt_date;
    let summary = prompt_sweep_once(&t.state, due_day).await.unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 0);

    let (to, body) = t.sms.sent().last().cloned().unwrap();
    assert_eq!(to, "+15551234567");
    assert!(body.starts_with("Hi Ada! Dr. Hopper would like"));

    let advanced = PhotoPromptScheduleRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(advanced.next_prompt_date, due_day + Days::new(7));
    assert_eq!(advanced.total_prompts_sent, 1);
    assert!(advanced.last_prompt_sent_at.is_some());

    let request = PhotoRequestRepo::latest_open_for_patient(&pool, patient.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.requested_via, "automated_sms");
    assert_eq!(request.order_id, Some(order.id));
    assert!(request.sms_sid.is_some());

    // Same day again: nothing is due any more.
    assert_eq!(prompt_sweep_once(&t.state, due_day).await.unwrap().sent, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_prompt_is_retried_next_time(pool: PgPool) {
    let (_patient, order) = delivered_order(&pool, Some("5551234567")).await;
    let t = common::build_test_app(pool.clone());
    follow_up_order(&t.state, order.id).await.unwrap();
    let due_day = Utc::now().date_naive() + Days::new(2);

    t.sms.fail_sends(true);
    let failed = prompt_sweep_once(&t.state, due_day).await.unwrap();
    assert_eq!(failed.failed, 1);
    let schedule = PhotoPromptScheduleRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(schedule.next_prompt_date, due_day);
    assert_eq!(schedule.total_prompts_sent, 0);

    t.sms.fail_sends(false);
    assert_eq!(prompt_sweep_once(&t.state, due_day).await.unwrap().sent, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn schedules_past_end_date_are_deactivated(pool: PgPool) {
    let (_patient, order) = delivered_order(&pool, Some("5551234567")).await;
    let t = common::build_test_app(pool.clone());
    follow_up_order(&t.state, order.id).await.unwrap();
    let schedule = PhotoPromptScheduleRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    let sms_before = t.sms.sent().len();

    let summary = prompt_sweep_once(&t.state, schedule.end_date + Days::new(1))
        .await
        .unwrap();

    assert_eq!(summary.deactivated, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(t.sms.sent().len(), sms_before);
    let schedule = PhotoPromptScheduleRepo::find_by_order(&pool, order.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!schedule.active);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn prompt_without_valid_phone_is_skipped(pool: PgPool) {
    let (_patient, order) = delivered_order(&pool, Some("555-0100")).await;
    let t = common::build_test_app(pool.clone());
    follow_up_order(&t.state, order.id).await.unwrap();

    let summary = prompt_sweep_once(&t.state, Utc::now().date_naive() + Days::new(2))
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.sent, 0);
    assert!(t.sms.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Physician digest
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn digest_reports_shipments_once(pool: PgPool) {
    common::create_user(&pool, "admin@example.com", "superadmin").await;
    let doc = common::create_user(&pool, "doc@example.com", "physician").await;
    let patient = common::create_patient(&pool, doc.id, Some("5551234567")).await;
    let order = common::create_order(
        &pool,
        &patient,
        CreateOrder {
            product: Some("Collagen Sheet".into()),
            ..Default::default()
        },
    )
    .await;
    let t = common::build_test_app(pool.clone());
    let admin = login(t.app(), "admin@example.com").await;

    for (status, tracking) in [("approved", None), ("shipped", Some("1Z999AA10123456784"))] {
        let response = post_json_session(
            t.app(),
            "/api/v1/admin/orders/update-status",
            serde_json::json!({ "order_id": order.id, "status": status, "tracking_code": tracking }),
            &admin,
        )
        .await;
        assert_eq!(response.status(), 200);
    }

    let summary = send_digest_once(&t.state).await.unwrap();
    assert_eq!(summary.physicians, 1);
    assert_eq!(summary.emails_sent, 1);
    assert_eq!(summary.changes_marked, 1);

    let emails = t.mailer.sent();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "doc@example.com");
    assert_eq!(emails[0].subject, "CollagenDirect: 1 Patient Order Update");
    assert!(emails[0].body.contains(&format!(
        "Order #{} | Ada Lovelace | Collagen Sheet | shipped | Tracking: 1Z999AA10123456784 \
         (https://www.ups.com/track?loc=en_US&tracknum=1Z999AA10123456784)",
        order.id
    )));

    let history = OrderStatusChangeRepo::list_for_order(&pool, order.id).await.unwrap();
    assert!(history[0].notification_sent_at.is_none(), "approved is not reported");
    assert!(history[1].notification_sent_at.is_some());

    let again = send_digest_once(&t.state).await.unwrap();
    assert_eq!(again.physicians, 0);
    assert_eq!(t.mailer.sent().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn digest_without_mailer_leaves_rows_pending(pool: PgPool) {
    let (_patient, order) = delivered_order(&pool, Some("5551234567")).await;
    sqlx::query(
        "INSERT INTO order_status_changes (order_id, old_status, new_status, changed_by_role)
         VALUES ($1, 'shipped', 'delivered', 'carrier')",
    )
    .bind(order.id)
    .execute(&pool)
    .await
    .unwrap();
    let t = common::build_test_app_with(pool.clone(), false);

    let summary = send_digest_once(&t.state).await.unwrap();

    assert_eq!(summary, Default::default());
    let pending = OrderStatusChangeRepo::list_pending_physician_updates(&pool, 24)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}
