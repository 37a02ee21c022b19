use url::Url;

/// Streaming profile that hands the transport stream through untouched.
pub const PASS_PROFILE: &str = "pass";

/// `{base}/stream/channel/{uuid}?profile=pass`.
///
/// The uuid is not checked against the session; the backend rejects
/// unknown channels itself.
pub fn resolve_stream_url(base_url: &Url, channel_uuid: &str) -> Url {
    let mut url = base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["stream", "channel", channel_uuid]);
    }
    url.set_query(Some(&format!("profile={}", PASS_PROFILE)));
    url.set_fragment(None);
    url
}
