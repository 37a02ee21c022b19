use thiserror::Error;
use tracing::{error, info};

use crate::backend::{BackendClient, BackendError, ServerInfo};
use crate::config::TvheadendConfig;

/// Oldest Tvheadend JSON API revision with the grids used here.
pub const MIN_API_VERSION: u64 = 15;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("You need to provide the URL of your Tvheadend server")]
    MissingUrl,
    #[error("Invalid Tvheadend server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Tvheadend server too old (api_version {found}, need {required} or newer)")]
    UnsupportedVersion { found: u64, required: u64 },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Validates the configuration, then checks that the server answers and
/// speaks a recent enough API. Returns the ready-to-use client.
pub async fn connect(config: &TvheadendConfig) -> Result<(BackendClient, ServerInfo), SetupError> {
    let url = config.server_url().inspect_err(|e| error!("{}", e))?;
    let credentials = config.credentials();
    let client = BackendClient::new(url, credentials.as_ref(), config.request_timeout())?;

    let info = client.server_info().await.inspect_err(|e| error!("{}", e))?;
    if info.api_version < MIN_API_VERSION {
        let err = SetupError::UnsupportedVersion {
            found: info.api_version,
            required: MIN_API_VERSION,
        };
        error!("{}", err);
        return Err(err);
    }

    info!(
        "Successfully connected to Tvheadend server: url={} api_version={} sw_version={} auth={}",
        client.base_url(),
        info.api_version,
        info.sw_version.as_deref().unwrap_or("<unknown>"),
        credentials.is_some()
    );
    Ok((client, info))
}
