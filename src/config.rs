use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::backend::Credentials;
use crate::index::{EpgSelection, IndexOptions, DEFAULT_CHANNEL_LIMIT};
use crate::setup::SetupError;
use crate::view::DisplayOptions;

/// Shortest URL that can point anywhere: `http://x`.
pub const MIN_URL_LEN: usize = "http://x".len();

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub tvheadend: TvheadendConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub epg: EpgConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Clone, Deserialize)]
pub struct TvheadendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_channel_limit")]
    pub channel_limit: usize,
}

impl Default for TvheadendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            request_timeout_secs: default_request_timeout_secs(),
            channel_limit: default_channel_limit(),
        }
    }
}

impl std::fmt::Debug for TvheadendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TvheadendConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("channel_limit", &self.channel_limit)
            .finish()
    }
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_channel_limit() -> usize {
    DEFAULT_CHANNEL_LIMIT
}

impl TvheadendConfig {
    /// Checks the server URL without touching the network.
    pub fn server_url(&self) -> Result<Url, SetupError> {
        let raw = self.url.trim();
        if raw.len() < MIN_URL_LEN {
            return Err(SetupError::MissingUrl);
        }
        let url = Url::parse(raw).map_err(|e| SetupError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(SetupError::InvalidUrl {
                url: raw.to_string(),
                reason: "expected an http(s) URL with a host".to_string(),
            });
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(SetupError::InvalidUrl {
                url: raw.to_string(),
                reason: "put credentials in username/password, not in the URL".to_string(),
            });
        }
        Ok(url)
    }

    /// Basic auth is only used when both username and password are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Credentials {
                username: u.to_string(),
                password: p.to_string(),
            }),
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub channel_numbers: bool,
    #[serde(default = "default_channel_icons")]
    pub channel_icons: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            channel_numbers: false,
            channel_icons: default_channel_icons(),
        }
    }
}

fn default_channel_icons() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpgConfig {
    #[serde(default)]
    pub selection: EpgSelection,
}

impl Settings {
    /// Loads `path` (TOML) overlaid by `TVHGUIDE__SECTION__KEY` variables.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TVHGUIDE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            channel_limit: self.tvheadend.channel_limit.max(1),
            selection: self.epg.selection,
        }
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            channel_numbers: self.display.channel_numbers,
            channel_icons: self.display.channel_icons,
        }
    }
}
