#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use woundcare_api::auth::jwt::JwtConfig;
use woundcare_api::auth::password::hash_password;
use woundcare_api::config::ServerConfig;
use woundcare_api::router::build_app_router;
use woundcare_api::state::AppState;
use woundcare_db::models::order::{CreateOrder, Order};
use woundcare_db::models::patient::{CreatePatient, Patient};
use woundcare_db::models::user::{CreateUser, User};
use woundcare_db::repositories::{OrderRepo, PatientRepo, UserRepo};
use woundcare_notify::email::{EmailError, Mailer, OutgoingEmail};
use woundcare_notify::sms::{MediaDownload, SmsError, SmsGateway, SmsReceipt};

pub const TEST_PASSWORD: &str = "Str0ng!Passw0rd";
pub const CARRIER_SECRET: &str = "carrier-test-secret";
pub const PUBLIC_BASE_URL: &str = "https://portal.test";

// ---------------------------------------------------------------------------
// Recording messaging doubles
// ---------------------------------------------------------------------------

/// SMS gateway that records every message and serves a canned media file.
#[derive(Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    media: Mutex<Option<MediaDownload>>,
    fail: AtomicBool,
}

impl RecordingSms {
    /// Messages sent so far as `(to, body)`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_media(&self, bytes: &[u8], content_type: &str) {
        *self.media.lock().unwrap() = Some(MediaDownload {
            bytes: bytes.to_vec(),
            content_type: Some(content_type.to_string()),
        });
    }

    /// Make every subsequent send fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SmsGateway for RecordingSms {
    async fn send_sms(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SmsError::Provider {
                status: 400,
                message: "test failure".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(SmsReceipt {
            sid: format!("SM{:04}", sent.len()),
            status: "queued".to_string(),
        })
    }

    async fn download_media(
        &self,
        _url: &str,
        _max_bytes: usize,
    ) -> Result<MediaDownload, SmsError> {
        self.media
            .lock()
            .unwrap()
            .clone()
            .ok_or(SmsError::NotConfigured)
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(uploads_dir: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        public_base_url: PUBLIC_BASE_URL.to_string(),
        uploads_dir: uploads_dir.to_path_buf(),
        carrier_webhook_secret: Some(CARRIER_SECRET.to_string()),
        delivery_sweep_interval_secs: 900,
        photo_prompt_interval_secs: 3600,
        digest_interval_secs: 86_400,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            session_expiry_mins: 60,
        },
    }
}

/// Everything a test needs to drive the app and inspect side effects.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sms: Arc<RecordingSms>,
    pub mailer: Arc<RecordingMailer>,
    pub uploads: TempDir,
}

impl TestApp {
    /// A fresh router over the same state (`oneshot` consumes the router).
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router over recording SMS / email doubles and
/// a temporary uploads directory.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, true)
}

/// Same as [`build_test_app`], optionally without a mailer.
pub fn build_test_app_with(pool: PgPool, with_mailer: bool) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let config = test_config(uploads.path());
    let sms = Arc::new(RecordingSms::default());
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sms: sms.clone(),
        mailer: with_mailer.then(|| mailer.clone() as Arc<dyn Mailer>),
    };
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        sms,
        mailer,
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

/// Create a user whose password is [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role: role.to_string(),
            practice_name: Some("Harbor Wound Clinic".to_string()),
        },
    )
    .await
    .unwrap()
}

pub async fn create_patient(pool: &PgPool, user_id: i64, phone: Option<&str>) -> Patient {
    PatientRepo::create(
        pool,
        &CreatePatient {
            user_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: phone.map(str::to_string),
            email: Some("ada@example.com".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

pub async fn create_order(pool: &PgPool, patient: &Patient, create: CreateOrder) -> Order {
    OrderRepo::create(
        pool,
        &CreateOrder {
            patient_id: patient.id,
            user_id: patient.user_id,
            ..create
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// A logged-in session: the cookie pair to send back and its CSRF token.
#[derive(Debug, Clone)]
pub struct Session {
    pub cookie: String,
    pub csrf: String,
}

/// Log in through the API and capture the session cookie and CSRF token.
pub async fn login(app: Router, email: &str) -> Session {
    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200, "login should succeed");

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string();
    let json = body_json(response).await;
    Session {
        cookie,
        csrf: json["csrf_token"].as_str().unwrap().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get_session(app: Router, uri: &str, session: &Session) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(COOKIE, &session.cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST JSON with the session cookie and its CSRF header.
pub async fn post_json_session(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    session: &Session,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, &session.cookie)
        .header("x-csrf-token", &session.csrf)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a form-encoded body, as the messaging provider does.
pub async fn post_form(app: Router, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub const MULTIPART_BOUNDARY: &str = "----woundcare-test-boundary";

/// A multipart body with one file part and optional text parts.
pub fn multipart_body(
    file_field: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
    text_fields: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, body: Vec<u8>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
