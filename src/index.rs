use std::collections::HashMap;

use serde::Deserialize;
use tracing::{info, warn};

use crate::backend::{BackendClient, BackendError};
use crate::channels::{self, Channel, EpgEvent};

/// Page-size bound for the channel grid. The API has no unbounded listing.
pub const DEFAULT_CHANNEL_LIMIT: usize = 999_999;

/// How the current EPG event of a channel is picked from the event grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpgSelection {
    /// First event per channel in response order.
    #[default]
    FirstSeen,
    /// First event per channel with `start <= now < stop`.
    CurrentlyAiring,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    pub channel_limit: usize,
    pub selection: EpgSelection,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            channel_limit: DEFAULT_CHANNEL_LIMIT,
            selection: EpgSelection::default(),
        }
    }
}

/// Channels and their current EPG events for one menu-load session.
///
/// Immutable once built; a reload builds a fresh index.
#[derive(Debug, Clone, Default)]
pub struct SessionIndex {
    channels: Vec<Channel>,
    by_uuid: HashMap<String, usize>,
    epg: HashMap<String, EpgEvent>,
    max_number: f64,
    number_width: usize,
}

impl SessionIndex {
    /// Sorts `channels` by numeric channel number and attaches at most one
    /// event per channel. Events for unknown channels are dropped.
    pub fn build(
        mut channels: Vec<Channel>,
        events: Vec<EpgEvent>,
        selection: EpgSelection,
        now: i64,
    ) -> Self {
        channels.sort_by(|a, b| a.number.total_cmp(&b.number));

        let mut by_uuid = HashMap::with_capacity(channels.len());
        let mut unique = Vec::with_capacity(channels.len());
        for channel in channels {
            if by_uuid.contains_key(&channel.uuid) {
                warn!("Duplicate channel uuid={} name=\"{}\" ignored", channel.uuid, channel.name);
                continue;
            }
            by_uuid.insert(channel.uuid.clone(), unique.len());
            unique.push(channel);
        }

        let max_number = unique
            .iter()
            .map(|c| c.number)
            .max_by(|a, b| a.total_cmp(b))
            .unwrap_or(0.0);
        let number_width = if unique.is_empty() {
            0
        } else {
            channels::number_width(max_number)
        };

        let mut epg: HashMap<String, EpgEvent> = HashMap::new();
        let mut orphaned = 0usize;
        for event in events {
            if !by_uuid.contains_key(&event.channel_uuid) {
                orphaned += 1;
                continue;
            }
            if selection == EpgSelection::CurrentlyAiring && !event.is_airing(now) {
                continue;
            }
            epg.entry(event.channel_uuid.clone()).or_insert(event);
        }
        if orphaned > 0 {
            warn!("Dropped {} EPG events referencing unknown channels", orphaned);
        }

        Self {
            channels: unique,
            by_uuid,
            epg,
            max_number,
            number_width,
        }
    }

    /// Channels in ascending channel-number order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, uuid: &str) -> Option<&Channel> {
        self.by_uuid.get(uuid).map(|&i| &self.channels[i])
    }

    pub fn current_event(&self, uuid: &str) -> Option<&EpgEvent> {
        self.epg.get(uuid)
    }

    pub fn epg_len(&self) -> usize {
        self.epg.len()
    }

    pub fn max_number(&self) -> f64 {
        self.max_number
    }

    pub fn number_width(&self) -> usize {
        self.number_width
    }
}

/// Fetches the channel grid and the EPG grid and builds a [`SessionIndex`].
pub async fn load(
    client: &BackendClient,
    options: &IndexOptions,
    now: i64,
) -> Result<SessionIndex, BackendError> {
    let grid = client.channel_grid(options.channel_limit).await?;
    let channels = grid.entries;
    if channels.len() >= options.channel_limit
        || grid.total.is_some_and(|t| t as usize > channels.len())
    {
        warn!(
            "Channel grid may be truncated: received={} total={:?} limit={}",
            channels.len(),
            grid.total,
            options.channel_limit
        );
    }

    // One event per channel is assumed to cover the "now" slot.
    let events = if channels.is_empty() {
        Vec::new()
    } else {
        let events = client.epg_grid(channels.len()).await?.entries;
        if events.len() >= channels.len() {
            warn!(
                "EPG grid hit its limit of {} events; some channels may lack a current event",
                channels.len()
            );
        }
        events
    };

    let received_events = events.len();
    let index = SessionIndex::build(channels, events, options.selection, now);
    info!(
        "Built session index: channels={} epg_events={} current_events={} number_width={}",
        index.channels().len(),
        received_events,
        index.epg_len(),
        index.number_width()
    );
    Ok(index)
}
