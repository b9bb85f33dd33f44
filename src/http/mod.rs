use crate::config::Config;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {}", .info.message)]
    Status { status: u16, info: ErrorInfo },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,
}

impl TransportError {
    /// Stable classification code, shared with the tool output shape.
    pub fn code(&self) -> &str {
        match self {
            TransportError::Request(_) => "upstream_error",
            TransportError::Status { info, .. } => &info.code,
            TransportError::Timeout(_) => "timeout",
            TransportError::Cancelled => "cancelled",
        }
    }

    pub fn retriable(&self) -> bool {
        match self {
            TransportError::Request(_) | TransportError::Timeout(_) => true,
            TransportError::Status { info, .. } => info.retriable,
            TransportError::Cancelled => false,
        }
    }
}

/// Executes one request against the admin API and returns the raw response body.
///
/// Implementations own URL construction, credentials and status classification.
/// `path` is relative to the API base and already percent-encoded.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

pub fn build_client(cfg: &Config) -> reqwest::Result<Client> {
    let mut default_headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(&cfg.user_agent) {
        default_headers.insert(USER_AGENT, ua);
    }
    // Authorization header is injected per request to allow key rotation later.
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
}

pub fn map_status_to_error(status: StatusCode, message: String) -> ErrorInfo {
    let (code, retriable) = match status {
        StatusCode::BAD_REQUEST => ("bad_request", false),
        StatusCode::UNAUTHORIZED => ("unauthorized", false),
        StatusCode::FORBIDDEN => ("forbidden", false),
        StatusCode::NOT_FOUND => ("not_found", false),
        StatusCode::CONFLICT => ("conflict", false),
        StatusCode::UNPROCESSABLE_ENTITY => ("unprocessable", false),
        StatusCode::TOO_MANY_REQUESTS => ("rate_limited", true),
        s if s.is_server_error() => ("upstream_error", true),
        _ => ("server_error", false),
    };
    ErrorInfo {
        code: code.to_string(),
        message,
        retriable,
    }
}

/// Percent-encode a single URL path segment (project ids, rate-limit ids).
pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn compute_backoff(attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(d) = retry_after {
        return d;
    }
    // Exponential backoff with jitter: base 200ms * 2^attempt, max 5s.
    let base = 200u64.saturating_mul(1u64 << attempt.min(5));
    let max = 5_000u64.min(base);
    let jitter = fastrand::u64(0..=max / 2);
    Duration::from_millis(max / 2 + jitter)
}

/// reqwest-backed transport for the OpenAI admin API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
    token: String,
    organization: Option<String>,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(cfg: &Config) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(cfg)?,
            api_url: cfg.api_url.clone(),
            token: cfg.token.clone(),
            organization: cfg.organization.clone(),
            max_retries: cfg.max_retries,
        })
    }

    fn request(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> reqwest::RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        let mut req = self
            .client
            .request(method.clone(), url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header("X-Client-Request-Id", &request_id);
        if let Some(org) = &self.organization {
            req = req.header("OpenAI-Organization", org);
        }
        if let Some(b) = body {
            req = req.json(b);
        }
        debug!("{} {} request_id={}", method, url, request_id);
        req
    }
}

impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempt: u32 = 0;
        loop {
            let res = match self.request(&method, &url, body.as_ref()).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("{} {} error sending request: {}", method, url, e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(compute_backoff(attempt, None)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(TransportError::Request(e));
                }
            };

            let status = res.status();
            if status.is_success() {
                return Ok(res.bytes().await?.to_vec());
            }

            // Retry on 429/5xx
            if (status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
                && attempt < self.max_retries
            {
                let retry_after = res
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                let backoff = compute_backoff(attempt, retry_after);
                warn!(
                    "{} {} retrying (status {}), backoff {:?}",
                    method, url, status, backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = res.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                info: map_status_to_error(status, text),
            });
        }
    }
}
