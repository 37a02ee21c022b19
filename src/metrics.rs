use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use tracing::warn;

lazy_static! {
    pub static ref BACKEND_FAILURES: IntCounterVec = register_int_counter_vec!(
        "tvhguide_backend_failures_total",
        "Failed requests against the Tvheadend API by failure kind",
        &["kind"]
    )
    .unwrap();
    pub static ref INDEX_REBUILDS: IntCounter = register_int_counter!(
        "tvhguide_index_rebuilds_total",
        "Number of successful channel/EPG index rebuilds"
    )
    .unwrap();
    pub static ref CACHED_CHANNELS: IntGauge = register_int_gauge!(
        "tvhguide_cached_channels",
        "Channels held by the current session index"
    )
    .unwrap();
    pub static ref CACHED_EPG_EVENTS: IntGauge = register_int_gauge!(
        "tvhguide_cached_epg_events",
        "Channels with a current EPG event in the session index"
    )
    .unwrap();
}

pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
