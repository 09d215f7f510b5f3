//! Integration tests for authenticated file serving.

mod common;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use common::{body_bytes, body_json, get, get_session, login, Session};
use sqlx::PgPool;
use woundcare_db::models::patient::Patient;
use woundcare_db::models::wound_photo::{CreateWoundPhoto, UPLOADED_VIA_SMS};
use woundcare_db::repositories::WoundPhotoRepo;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    t: common::TestApp,
    owner: Session,
    other: Session,
    admin: Session,
    patient: Patient,
}

async fn fixture(pool: PgPool) -> Fixture {
    let doc = common::create_user(&pool, "doc@example.com", "physician").await;
    common::create_user(&pool, "other@example.com", "physician").await;
    common::create_user(&pool, "admin@example.com", "superadmin").await;
    let patient = common::create_patient(&pool, doc.id, Some("5551234567")).await;
    let t = common::build_test_app(pool);
    let owner = login(t.app(), "doc@example.com").await;
    let other = login(t.app(), "other@example.com").await;
    let admin = login(t.app(), "admin@example.com").await;
    Fixture {
        t,
        owner,
        other,
        admin,
        patient,
    }
}

/// Write `bytes` to `wound_photos/<name>` under the test uploads root.
fn write_upload(t: &common::TestApp, name: &str, bytes: &[u8]) -> String {
    let dir = t.uploads.path().join("wound_photos");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), bytes).unwrap();
    format!("/uploads/wound_photos/{name}")
}

// ---------------------------------------------------------------------------
// Generic download
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn download_is_limited_to_superadmins(pool: PgPool) {
    let f = fixture(pool).await;
    let path = write_upload(&f.t, "wound-other.png", PNG);

    for session in [&f.owner, &f.other] {
        let uri = format!("/api/v1/files?p={path}&mode=view&csrf={}", session.csrf);
        let response = get_session(f.t.app(), &uri, session).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let uri = format!("/api/v1/files?p={path}&mode=view&csrf={}", f.admin.csrf);
    let response = get_session(f.t.app(), &uri, &f.admin).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn view_mode_serves_inline(pool: PgPool) {
    let f = fixture(pool).await;
    let path = write_upload(&f.t, "scan.png", PNG);

    let uri = format!("/api/v1/files?p={path}&mode=view&csrf={}", f.admin.csrf);
    let response = get_session(f.t.app(), &uri, &f.admin).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "inline; filename=\"scan.png\""
    );
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(body_bytes(response).await, PNG);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn default_mode_downloads_as_attachment(pool: PgPool) {
    let f = fixture(pool).await;
    let path = write_upload(&f.t, "notes.txt", b"hello");

    let uri = format!("/api/v1/files?p={path}&csrf={}", f.admin.csrf);
    let response = get_session(f.t.app(), &uri, &f.admin).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment;"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn download_requires_session_and_csrf(pool: PgPool) {
    let f = fixture(pool).await;
    let path = write_upload(&f.t, "scan.png", PNG);

    let anonymous = get(f.t.app(), &format!("/api/v1/files?p={path}")).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let no_csrf = get_session(f.t.app(), &format!("/api/v1/files?p={path}"), &f.admin).await;
    assert_eq!(no_csrf.status().as_u16(), 419);

    let wrong_csrf = get_session(
        f.t.app(),
        &format!("/api/v1/files?p={path}&csrf=not-the-token"),
        &f.admin,
    )
    .await;
    assert_eq!(wrong_csrf.status().as_u16(), 419);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn paths_outside_uploads_are_refused(pool: PgPool) {
    let f = fixture(pool).await;
    write_upload(&f.t, "scan.png", PNG);

    for p in [
        "/uploads/../Cargo.toml",
        "/uploads/wound_photos/../../etc/passwd",
        "/etc/passwd",
        "uploads/wound_photos/scan.png",
    ] {
        let uri = format!("/api/v1/files?p={p}&csrf={}", f.admin.csrf);
        let response = get_session(f.t.app(), &uri, &f.admin).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "path {p}");
        assert_eq!(body_json(response).await["error"], "Invalid file path");
    }

    let missing = get_session(
        f.t.app(),
        &format!("/api/v1/files?p=/uploads/nope.png&csrf={}", f.admin.csrf),
        &f.admin,
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let empty = get_session(
        f.t.app(),
        &format!("/api/v1/files?csrf={}", f.admin.csrf),
        &f.admin,
    )
    .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Wound photos
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn wound_photo_is_served_to_owner_and_admin_only(pool: PgPool) {
    let f = fixture(pool.clone()).await;
    let path = write_upload(&f.t, "wound-1.png", PNG);
    let photo = WoundPhotoRepo::create_linked(
        &pool,
        &CreateWoundPhoto {
            patient_id: f.patient.id,
            uploaded_via: UPLOADED_VIA_SMS,
            photo_path: path,
            photo_mime: "image/png".to_string(),
            photo_size_bytes: PNG.len() as i64,
            patient_notes: None,
            from_phone: Some("+15551234567".to_string()),
        },
    )
    .await
    .unwrap();
    let uri = format!("/api/v1/wound-photos/{}", photo.id);

    let owner = get_session(f.t.app(), &uri, &f.owner).await;
    assert_eq!(owner.status(), StatusCode::OK);
    assert_eq!(owner.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(owner).await, PNG);

    let admin = get_session(f.t.app(), &uri, &f.admin).await;
    assert_eq!(admin.status(), StatusCode::OK);

    let other = get_session(f.t.app(), &uri, &f.other).await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);

    let unknown = get_session(f.t.app(), "/api/v1/wound-photos/999999", &f.owner).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

    let gallery = get_session(
        f.t.app(),
        &format!("/api/v1/patients/{}/wound-photos", f.patient.id),
        &f.owner,
    )
    .await;
    assert_eq!(gallery.status(), StatusCode::OK);
    let json = body_json(gallery).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], photo.id);

    let foreign_gallery = get_session(
        f.t.app(),
        &format!("/api/v1/patients/{}/wound-photos", f.patient.id),
        &f.other,
    )
    .await;
    assert_eq!(foreign_gallery.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wound_photo_with_missing_file_is_not_found(pool: PgPool) {
    let f = fixture(pool.clone()).await;
    let photo = WoundPhotoRepo::create_linked(
        &pool,
        &CreateWoundPhoto {
            patient_id: f.patient.id,
            uploaded_via: UPLOADED_VIA_SMS,
            photo_path: "/uploads/wound_photos/gone.jpg".to_string(),
            photo_mime: "image/jpeg".to_string(),
            photo_size_bytes: 10,
            patient_notes: None,
            from_phone: None,
        },
    )
    .await
    .unwrap();

    let response = get_session(
        f.t.app(),
        &format!("/api/v1/wound-photos/{}", photo.id),
        &f.owner,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
