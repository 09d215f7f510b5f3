use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use woundcare_api::background;
use woundcare_api::config::ServerConfig;
use woundcare_api::router::build_app_router;
use woundcare_api::state::AppState;
use woundcare_notify::email::{EmailConfig, EmailDelivery, Mailer};
use woundcare_notify::sms::{DisabledSmsGateway, SmsGateway, TwilioClient, TwilioConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "woundcare_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = woundcare_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    woundcare_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    woundcare_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Messaging ---
    let sms: Arc<dyn SmsGateway> = match TwilioConfig::from_env() {
        Some(twilio) => Arc::new(TwilioClient::new(twilio).expect("Failed to build Twilio client")),
        None => {
            tracing::warn!("TWILIO_* not set, outbound SMS disabled");
            Arc::new(DisabledSmsGateway)
        }
    };

    let mailer = EmailConfig::from_env().map(|c| Arc::new(EmailDelivery::new(c)) as Arc<dyn Mailer>);
    if mailer.is_none() {
        tracing::warn!("SMTP_HOST not set, outbound email disabled");
    }

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sms,
        mailer,
    };

    // --- Background jobs ---
    let cancel = CancellationToken::new();
    let jobs = vec![
        tokio::spawn(background::delivery_confirmations::run(state.clone(), cancel.clone())),
        tokio::spawn(background::photo_prompts::run(state.clone(), cancel.clone())),
        tokio::spawn(background::physician_digest::run(state.clone(), cancel.clone())),
    ];
    tracing::info!("Background jobs started (delivery sweep, photo prompts, physician digest)");

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    for handle in jobs {
        if tokio::time::timeout(shutdown_timeout, handle).await.is_err() {
            tracing::warn!("Background job did not stop within the shutdown timeout");
        }
    }
    tracing::info!("Background jobs stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
