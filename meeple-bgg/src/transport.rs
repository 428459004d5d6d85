//! HTTP transport seam.
//!
//! [`BggClient`](crate::BggClient) only ever issues GET requests against the
//! XML API, so the seam is a single method. Tests swap in a scripted stub.

use tokio::time::Duration;

use crate::config::BggConfig;
use crate::error::BggError;

const USER_AGENT: &str = concat!("meeple/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Something that can perform a GET against the catalog API.
///
/// `path` is relative to the API root (e.g. `"thing"`). Errors returned here
/// are treated as transient transport faults and retried.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, BggError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &BggConfig) -> Result<Self, BggError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, BggError> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query);
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}
