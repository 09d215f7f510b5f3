use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Absolute base URL used in links sent to patients and users.
    pub public_base_url: String,
    /// Root directory for stored uploads (wound photos, order documents).
    pub uploads_dir: PathBuf,
    /// Shared secret for the carrier webhook. `None` disables the endpoint.
    pub carrier_webhook_secret: Option<String>,
    /// Interval of the delivered-order follow-up sweep.
    pub delivery_sweep_interval_secs: u64,
    /// Interval of the photo-prompt sweep.
    pub photo_prompt_interval_secs: u64,
    /// Interval of the physician digest job.
    pub digest_interval_secs: u64,
    /// Session token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                    |
    /// |--------------------------------|----------------------------|
    /// | `HOST`                         | `0.0.0.0`                  |
    /// | `PORT`                         | `3000`                     |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                       |
    /// | `PUBLIC_BASE_URL`              | `http://localhost:3000`    |
    /// | `UPLOADS_DIR`                  | `./uploads`                |
    /// | `CARRIER_WEBHOOK_SECRET`       | unset (webhook disabled)   |
    /// | `DELIVERY_SWEEP_INTERVAL_SECS` | `900`                      |
    /// | `PHOTO_PROMPT_INTERVAL_SECS`   | `3600`                     |
    /// | `DIGEST_INTERVAL_SECS`         | `86400`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let uploads_dir = PathBuf::from(
            std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".into()),
        );

        let carrier_webhook_secret = std::env::var("CARRIER_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: secs_var("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: secs_var("SHUTDOWN_TIMEOUT_SECS", 30),
            public_base_url,
            uploads_dir,
            carrier_webhook_secret,
            delivery_sweep_interval_secs: secs_var("DELIVERY_SWEEP_INTERVAL_SECS", 900),
            photo_prompt_interval_secs: secs_var("PHOTO_PROMPT_INTERVAL_SECS", 3600),
            digest_interval_secs: secs_var("DIGEST_INTERVAL_SECS", 86_400),
            jwt: JwtConfig::from_env(),
        }
    }
}

fn secs_var(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid u64")),
        Err(_) => default,
    }
}
