use serde::{Deserialize, Serialize};

/// A channel as listed by the Tvheadend channel grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub uuid: String,
    /// Fractional numbers are used for sub-channels (5.1, 5.2, ...).
    #[serde(default)]
    pub number: f64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "icon_public_url", default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// One entry of the EPG event grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpgEvent {
    #[serde(rename = "channelUuid")]
    pub channel_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
}

impl EpgEvent {
    /// True when `start <= now < stop`. Events without both bounds never air.
    pub fn is_airing(&self, now: i64) -> bool {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => start <= now && now < stop,
            _ => false,
        }
    }
}

/// Backend list envelope: `{"entries": [...], "total": n}`.
#[derive(Debug, Deserialize)]
pub struct Grid<T> {
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Renders a channel number the way the backend shows it: whole numbers
/// without a decimal point, sub-channels with theirs.
pub fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

/// Width used to zero-pad channel numbers: the digit count of the integer
/// part of the highest channel number.
pub fn number_width(max_number: f64) -> usize {
    if !max_number.is_finite() {
        return 0;
    }
    format_number(max_number.trunc()).trim_start_matches('-').len()
}

pub fn pad_number(number: f64, width: usize) -> String {
    format!("{:0>width$}", format_number(number), width = width)
}
