//! HTTP client for the Tvheadend JSON API.
//!
//! Every request carries the basic-auth header computed once in
//! [`BackendClient::new`]. Failures collapse into [`BackendError`]: 401/403
//! become [`BackendError::Auth`], everything else (transport errors, other
//! HTTP statuses, undecodable bodies) becomes [`BackendError::Network`].

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::channels::{Channel, EpgEvent, Grid};
use crate::metrics::BACKEND_FAILURES;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Tvheadend rejected the credentials (HTTP {0})")]
    Auth(u16),
    #[error("Tvheadend server unreachable: {0}")]
    Network(String),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Auth(_) => "auth",
            BackendError::Network(_) => "network",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// `Basic base64(username:password)`.
    pub fn header_value(&self) -> Result<HeaderValue, BackendError> {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::try_from(format!("Basic {}", token))
            .map_err(|e| BackendError::Network(format!("invalid credential header: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Subset of `/api/serverinfo` the gateway cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub api_version: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sw_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<HeaderValue>,
}

impl BackendClient {
    pub fn new(
        base_url: Url,
        credentials: Option<&Credentials>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let auth = credentials.map(Credentials::header_value).transpose()?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn fail(&self, err: BackendError) -> BackendError {
        BACKEND_FAILURES.with_label_values(&[err.kind()]).inc();
        err
    }

    /// GET `path` with `query` and decode the body as JSON.
    pub async fn fetch(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.endpoint(path);
        debug!("Tvheadend request: url={} query={:?}", url, query);

        let mut request = self.http.get(&url).query(query);
        if let Some(auth) = &self.auth {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                error!("An exception occurred requesting {}: {:?}", url, e);
                return Err(self.fail(BackendError::Network(e.to_string())));
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("An HTTP error occurred: url={} status={}", url, status);
            return Err(self.fail(BackendError::Auth(status.as_u16())));
        }
        if !status.is_success() {
            error!("An HTTP error occurred: url={} status={}", url, status);
            return Err(self.fail(BackendError::Network(format!("HTTP {}", status))));
        }

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to read response body from {}: {:?}", url, e);
                return Err(self.fail(BackendError::Network(e.to_string())));
            }
        };

        serde_json::from_slice(&body).map_err(|e| {
            error!("Malformed JSON from {}: {}", url, e);
            self.fail(BackendError::Network(format!("malformed response: {e}")))
        })
    }

    async fn fetch_as<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let value = self.fetch(path, query).await?;
        serde_json::from_value(value).map_err(|e| {
            error!("Unexpected response shape from {}: {}", path, e);
            self.fail(BackendError::Network(format!("unexpected response: {e}")))
        })
    }

    pub async fn server_info(&self) -> Result<ServerInfo, BackendError> {
        self.fetch_as("/api/serverinfo", &[]).await
    }

    pub async fn channel_grid(&self, limit: usize) -> Result<Grid<Channel>, BackendError> {
        self.fetch_as(
            "/api/channel/grid",
            &[("start", "0".to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn epg_grid(&self, limit: usize) -> Result<Grid<EpgEvent>, BackendError> {
        self.fetch_as(
            "/api/epg/events/grid",
            &[("start", "0".to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}
