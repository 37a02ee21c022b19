//! Per-channel display metadata.
//!
//! Everything here is derived from the session index and an explicit `now`;
//! nothing is cached, so time-relative fields never go stale.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::channels::{self, Channel, EpgEvent};
use crate::index::SessionIndex;

/// Fallback session length when the current program has no known end.
pub const DEFAULT_DURATION_MS: i64 = 6 * 60 * 60 * 1000;
/// Added to the program end so the client session outlives the program.
pub const STOP_PADDING_SECS: i64 = 15 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("channel {0} is not in the current session")]
    NotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientPlatform {
    Android,
    #[default]
    Other,
}

impl ClientPlatform {
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.to_ascii_lowercase().contains("android") {
            ClientPlatform::Android
        } else {
            ClientPlatform::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayOptions {
    pub channel_numbers: bool,
    pub channel_icons: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub base_url: &'a Url,
    pub display: DisplayOptions,
    pub platform: ClientPlatform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub start: String,
    pub stop: String,
    pub duration_min: i64,
    pub elapsed_min: i64,
    pub percent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelView {
    pub uuid: String,
    pub title: String,
    pub summary: String,
    pub tagline: Option<String>,
    pub thumb: Option<String>,
    pub duration_ms: i64,
    pub progress: Option<Progress>,
}

pub fn render_channel<Tz>(
    index: &SessionIndex,
    uuid: &str,
    now: &DateTime<Tz>,
    ctx: &RenderContext<'_>,
) -> Result<ChannelView, RenderError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let channel = index
        .channel(uuid)
        .ok_or_else(|| RenderError::NotFound(uuid.to_string()))?;
    let event = index.current_event(uuid);
    let now_secs = now.timestamp();

    let title = display_title(channel, event, index.number_width(), ctx);
    let thumb = if ctx.display.channel_icons {
        thumbnail(channel, ctx.base_url)
    } else {
        None
    };
    let tagline = event.and_then(|e| e.title.clone());
    let description = event
        .and_then(|e| e.description.clone())
        .unwrap_or_default();
    let duration_ms = remaining_duration_ms(event.and_then(|e| e.stop), now_secs);

    let progress = event.and_then(|e| match (e.start, e.stop) {
        (Some(start), Some(stop)) => Some(progress(start, stop, now)),
        _ => None,
    });

    let summary = match &progress {
        Some(p) => format!(
            "{} - {} ({} min) ★ {}% ★ {} ★ {}",
            p.start,
            p.stop,
            p.duration_min,
            p.percent,
            tagline.as_deref().unwrap_or_default(),
            description
        ),
        None => description,
    };

    Ok(ChannelView {
        uuid: channel.uuid.clone(),
        title,
        summary,
        tagline,
        thumb,
        duration_ms,
        progress,
    })
}

fn display_title(
    channel: &Channel,
    event: Option<&EpgEvent>,
    number_width: usize,
    ctx: &RenderContext<'_>,
) -> String {
    let mut title = channel.name.clone();

    if ctx.platform == ClientPlatform::Android {
        if let Some(program) = event.and_then(|e| e.title.as_deref()) {
            title = format!("{} ({})", title, program);
        }
    }

    if ctx.display.channel_numbers {
        title = format!(
            "{}. {}",
            channels::pad_number(channel.number, number_width),
            title
        );
    }

    title
}

/// Absolute icon URLs pass through; relative ones hang off the server URL.
pub fn thumbnail(channel: &Channel, base_url: &Url) -> Option<String> {
    let icon = channel.icon_url.as_deref().filter(|i| !i.is_empty())?;
    if icon.starts_with("http://") || icon.starts_with("https://") {
        return Some(icon.to_string());
    }
    Some(format!(
        "{}/{}",
        base_url.as_str().trim_end_matches('/'),
        icon.trim_start_matches('/')
    ))
}

/// Milliseconds until the program ends plus [`STOP_PADDING_SECS`].
///
/// Never negative; an unknown end falls back to [`DEFAULT_DURATION_MS`].
pub fn remaining_duration_ms(stop: Option<i64>, now: i64) -> i64 {
    match stop {
        Some(stop) => stop
            .saturating_sub(now)
            .saturating_add(STOP_PADDING_SECS)
            .saturating_mul(1000)
            .max(0),
        None => DEFAULT_DURATION_MS,
    }
}

pub fn progress<Tz>(start: i64, stop: i64, now: &DateTime<Tz>) -> Progress
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let duration_secs = stop.saturating_sub(start).max(0);
    let elapsed_secs = now.timestamp().saturating_sub(start).max(0);
    let percent = if duration_secs > 0 {
        (i128::from(elapsed_secs) * 100 / i128::from(duration_secs)).clamp(0, 100) as i64
    } else {
        0
    };

    let tz = now.timezone();
    Progress {
        start: clock(&tz, start),
        stop: clock(&tz, stop),
        duration_min: duration_secs / 60,
        elapsed_min: elapsed_secs / 60,
        percent,
    }
}

fn clock<Tz>(tz: &Tz, epoch: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_opt(epoch, 0)
        .earliest()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}
