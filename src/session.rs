use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{BackendClient, BackendError};
use crate::index::{self, IndexOptions, SessionIndex};
use crate::metrics::{CACHED_CHANNELS, CACHED_EPG_EVENTS, INDEX_REBUILDS};

/// Holds the index of the most recent menu load.
///
/// Rebuilds happen outside the lock and are swapped in whole, so readers
/// always see either the previous or the new index.
#[derive(Clone, Default)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Arc<SessionIndex>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<SessionIndex>> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, index: SessionIndex) -> Arc<SessionIndex> {
        let index = Arc::new(index);
        CACHED_CHANNELS.set(index.channels().len() as i64);
        CACHED_EPG_EVENTS.set(index.epg_len() as i64);
        *self.current.write().await = Some(index.clone());
        index
    }

    /// Fetches fresh data and swaps it in. On failure the previous index
    /// stays in place.
    pub async fn rebuild(
        &self,
        client: &BackendClient,
        options: &IndexOptions,
        now: i64,
    ) -> Result<Arc<SessionIndex>, BackendError> {
        match index::load(client, options, now).await {
            Ok(index) => {
                INDEX_REBUILDS.inc();
                let index = self.replace(index).await;
                info!("Session index replaced (channels={})", index.channels().len());
                Ok(index)
            }
            Err(e) => {
                warn!("Session index rebuild failed: {}", e);
                Err(e)
            }
        }
    }
}
