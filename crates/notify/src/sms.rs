//! SMS delivery and MMS media retrieval.
//!
//! [`TwilioClient`] talks to the Twilio REST API with HTTP basic auth
//! (account SID / auth token). Handlers depend on the [`SmsGateway`] trait so
//! tests can substitute a recording implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// HTTP timeout for a single provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Default REST endpoint.
const DEFAULT_API_BASE: &str = "https://api.twilio.com/2010-04-01";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for SMS provider failures.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// No provider credentials are configured.
    #[error("SMS provider is not configured")]
    NotConfigured,

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("SMS provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// A downloaded media file exceeded the size limit.
    #[error("Media exceeds {limit} bytes")]
    MediaTooLarge { limit: usize },

    /// A media URL that does not point at the provider's API host.
    #[error("Refusing media URL outside the provider host: {0}")]
    UntrustedMediaUrl(String),
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Provider acknowledgement of a queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsReceipt {
    pub sid: String,
    pub status: String,
}

/// A media file fetched from the provider.
#[derive(Debug, Clone)]
pub struct MediaDownload {
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the provider, if any.
    pub content_type: Option<String>,
}

/// Outbound SMS and inbound MMS media access.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `body` to `to` (E.164).
    async fn send_sms(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError>;

    /// Download an MMS attachment, refusing anything larger than `max_bytes`.
    async fn download_media(&self, url: &str, max_bytes: usize)
        -> Result<MediaDownload, SmsError>;
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Twilio credentials and sender number.
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

impl TwilioConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless the SID, token and sender number are all set.
    ///
    /// | Variable             | Required | Default                              |
    /// |----------------------|----------|--------------------------------------|
    /// | `TWILIO_ACCOUNT_SID` | yes      |                                      |
    /// | `TWILIO_AUTH_TOKEN`  | yes      |                                      |
    /// | `TWILIO_FROM_NUMBER` | yes      |                                      |
    /// | `TWILIO_API_BASE`    | no       | `https://api.twilio.com/2010-04-01`  |
    pub fn from_env() -> Option<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            account_sid: non_empty("TWILIO_ACCOUNT_SID")?,
            auth_token: non_empty("TWILIO_AUTH_TOKEN")?,
            from_number: non_empty("TWILIO_FROM_NUMBER")?,
            api_base: non_empty("TWILIO_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

// ---------------------------------------------------------------------------
// Twilio client
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

/// REST client for the Twilio Messages API.
pub struct TwilioClient {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, config })
    }

    async fn provider_error(response: reqwest::Response) -> SmsError {
        let status = response.status().as_u16();
        let message = response
            .json::<ProviderErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "no error message".to_string());
        SmsError::Provider { status, message }
    }

    /// Whether `url` is served by the configured API host (same scheme, host
    /// and port). Credentials are only ever sent to such URLs.
    fn is_provider_url(&self, url: &str) -> bool {
        let (Ok(base), Ok(candidate)) = (
            reqwest::Url::parse(&self.config.api_base),
            reqwest::Url::parse(url),
        ) else {
            return false;
        };
        candidate.scheme() == base.scheme()
            && candidate.host_str().is_some()
            && candidate.host_str() == base.host_str()
            && candidate.port_or_known_default() == base.port_or_known_default()
    }
}

#[async_trait]
impl SmsGateway for TwilioClient {
    async fn send_sms(&self, to: &str, body: &str) -> Result<SmsReceipt, SmsError> {
        let form = [
            ("From", self.config.from_number.as_str()),
            ("To", to),
            ("Body", body),
        ];
        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let message: MessageResponse = response.json().await?;
        tracing::debug!(sid = %message.sid, "SMS queued");
        Ok(SmsReceipt {
            sid: message.sid,
            status: message.status.unwrap_or_else(|| "queued".to_string()),
        })
    }

    async fn download_media(
        &self,
        url: &str,
        max_bytes: usize,
    ) -> Result<MediaDownload, SmsError> {
        if !self.is_provider_url(url) {
            return Err(SmsError::UntrustedMediaUrl(url.to_string()));
        }

        // Cross-host redirects (the provider's CDN) drop the Authorization header.
        let mut response = self
            .client
            .get(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes as u64)
        {
            return Err(SmsError::MediaTooLarge { limit: max_bytes });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Chunked bodies carry no length up front; stop as soon as the limit is passed.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(SmsError::MediaTooLarge { limit: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(MediaDownload {
            bytes,
            content_type,
        })
    }
}

/// Gateway used when no provider is configured: every call fails with
/// [`SmsError::NotConfigured`].
pub struct DisabledSmsGateway;

#[async_trait]
impl SmsGateway for DisabledSmsGateway {
    async fn send_sms(&self, to: &str, _body: &str) -> Result<SmsReceipt, SmsError> {
        tracing::warn!(to = %woundcare_core::phone::mask(to), "SMS skipped, provider not configured");
        Err(SmsError::NotConfigured)
    }

    async fn download_media(
        &self,
        _url: &str,
        _max_bytes: usize,
    ) -> Result<MediaDownload, SmsError> {
        Err(SmsError::NotConfigured)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15550001111".to_string(),
            api_base: "https://api.twilio.com/2010-04-01/".to_string(),
        }
    }

    #[test]
    fn messages_url_includes_account() {
        assert_eq!(
            config().messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn new_does_not_fail() {
        assert!(TwilioClient::new(config()).is_ok());
    }

    #[test]
    fn provider_error_display() {
        let err = SmsError::Provider {
            status: 400,
            message: "The 'To' number is not a valid phone number.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "SMS provider returned HTTP 400: The 'To' number is not a valid phone number."
        );
    }

    #[test]
    fn only_provider_host_urls_are_trusted() {
        let client = TwilioClient::new(config()).unwrap();
        assert!(client.is_provider_url(
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages/MM1/Media/ME1"
        ));
        assert!(!client.is_provider_url("https://attacker.example/collect"));
        assert!(!client.is_provider_url("http://api.twilio.com/2010-04-01/Accounts/AC123"));
        assert!(!client.is_provider_url("https://api.twilio.com.attacker.example/x"));
        assert!(!client.is_provider_url("https://api.twilio.com:8443/x"));
        assert!(!client.is_provider_url("not a url"));
    }

    #[tokio::test]
    async fn foreign_media_host_is_refused_before_any_request() {
        let client = TwilioClient::new(config()).unwrap();
        let result = client
            .download_media("https://attacker.example/collect", 1024)
            .await;
        assert!(matches!(result, Err(SmsError::UntrustedMediaUrl(_))));
    }

    /// Serve one chunked response of `chunks` x 1 KiB and return the API base.
    async fn chunked_media_server(chunks: usize) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\n\
                        Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            let _ = socket.write_all(head.as_bytes()).await;
            for _ in 0..chunks {
                let _ = socket.write_all(b"400\r\n").await;
                let _ = socket.write_all(&[0xffu8; 1024]).await;
                let _ = socket.write_all(b"\r\n").await;
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });
        format!("http://{addr}/2010-04-01")
    }

    #[tokio::test]
    async fn chunked_media_over_limit_is_rejected() {
        let api_base = chunked_media_server(8).await;
        let client = TwilioClient::new(TwilioConfig {
            api_base: api_base.clone(),
            ..config()
        })
        .unwrap();

        let result = client
            .download_media(&format!("{api_base}/Accounts/AC123/Media/ME1"), 4 * 1024)
            .await;
        assert!(matches!(result, Err(SmsError::MediaTooLarge { limit: 4096 })));
    }

    #[tokio::test]
    async fn chunked_media_within_limit_is_returned() {
        let api_base = chunked_media_server(2).await;
        let client = TwilioClient::new(TwilioConfig {
            api_base: api_base.clone(),
            ..config()
        })
        .unwrap();

        let media = client
            .download_media(&format!("{api_base}/Accounts/AC123/Media/ME1"), 4 * 1024)
            .await
            .unwrap();
        assert_eq!(media.bytes.len(), 2048);
        assert_eq!(media.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn disabled_gateway_reports_not_configured() {
        let result = DisabledSmsGateway.send_sms("+15551234567", "hi").await;
        assert!(matches!(result, Err(SmsError::NotConfigured)));
    }
}
