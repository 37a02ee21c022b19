mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::util::ServiceExt;
use tvhguide::index::IndexOptions;
use tvhguide::view::{ChannelView, DisplayOptions, DEFAULT_DURATION_MS};
use tvhguide::{ErrorBody, MenuEntry};

fn display() -> DisplayOptions {
    DisplayOptions {
        channel_numbers: false,
        channel_icons: true,
    }
}

async fn app_for(backend: Router, display: DisplayOptions) -> (Router, url::Url) {
    let url = common::spawn(backend).await;
    let app = tvhguide::create_app(
        common::client(url.clone()),
        IndexOptions::default(),
        display,
    );
    (app, url)
}

async fn get(app: &Router, uri: &str, user_agent: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("User-Agent", user_agent)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_menu_lists_channels_in_numeric_order() {
    let (app, _) = app_for(common::tvheadend(19, false), display()).await;

    let response = get(&app, "/", "test").await;
    assert_eq!(response.status(), StatusCode::OK);

    let entries: Vec<MenuEntry> = body_json(response).await;
    let order: Vec<&str> = entries.iter().map(|e| e.uuid.as_str()).collect();
    assert_eq!(order, vec!["ch-five", "ch-five-one", "ch-six", "ch-ten"]);
    assert_eq!(entries[1].number, 5.1);
    assert_eq!(entries[0].key, "/channel/ch-five");
    assert_eq!(entries[0].stream_key, "/channel/ch-five/livestream");
}

#[tokio::test]
async fn test_channel_view_after_menu_load() {
    let (app, url) = app_for(common::tvheadend(19, false), display()).await;
    assert_eq!(get(&app, "/", "test").await.status(), StatusCode::OK);

    let response = get(&app, "/channel/ch-five", "Mozilla/5.0").await;
    assert_eq!(response.status(), StatusCode::OK);
    let view: ChannelView = body_json(response).await;

    assert_eq!(view.title, "Five");
    assert_eq!(view.tagline.as_deref(), Some("News"));
    assert_eq!(view.thumb.as_deref(), Some("https://logos.example/five.png"));
    assert!(view.summary.contains("(60 min) ★ "), "{}", view.summary);
    assert!(view.summary.ends_with("★ News ★ Headlines"), "{}", view.summary);
    let progress = view.progress.unwrap();
    assert_eq!(progress.duration_min, 60);
    assert!((9..=11).contains(&progress.elapsed_min));
    // stop is 3000s away, plus 900s padding
    assert!((3_800_000..=3_900_000).contains(&view.duration_ms));

    let ten: ChannelView = body_json(get(&app, "/channel/ch-ten", "test").await).await;
    assert_eq!(
        ten.thumb,
        Some(format!("{}imagecache/10", url.as_str()))
    );

    let six: ChannelView = body_json(get(&app, "/channel/ch-six", "test").await).await;
    assert_eq!(six.tagline, None);
    assert_eq!(six.summary, "");
    assert_eq!(six.duration_ms, DEFAULT_DURATION_MS);
}

#[tokio::test]
async fn test_channel_view_numbers_and_android_title() {
    let display = DisplayOptions {
        channel_numbers: true,
        channel_icons: false,
    };
    let (app, _) = app_for(common::tvheadend(19, false), display).await;
    assert_eq!(get(&app, "/", "test").await.status(), StatusCode::OK);

    let view: ChannelView = body_json(
        get(&app, "/channel/ch-five", "Plex/9.0 (Linux; Android 13)").await,
    )
    .await;
    assert_eq!(view.title, "05. Five (News)");
    assert_eq!(view.thumb, None);

    let sub: ChannelView = body_json(get(&app, "/channel/ch-five-one", "test").await).await;
    assert_eq!(sub.title, "5.1. Five Plus");
}

#[tokio::test]
async fn test_channel_before_menu_is_not_found() {
    let (app, _) = app_for(common::tvheadend(19, false), display()).await;

    let response = get(&app, "/channel/ch-five", "test").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(get(&app, "/", "test").await.status(), StatusCode::OK);
    let response = get(&app, "/channel/ch-unknown", "test").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_livestream_redirects_to_pass_profile() {
    let (app, url) = app_for(common::tvheadend(19, false), display()).await;

    let response = get(&app, "/channel/abc-123/livestream", "test").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(
        location,
        format!("{}stream/channel/abc-123?profile=pass", url.as_str())
    );
}

#[tokio::test]
async fn test_menu_reports_auth_error() {
    let (app, _) = app_for(common::tvheadend(19, true), display()).await;

    let response = get(&app, "/", "test").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.header, "Error");
    assert!(body.message.contains("401"));
}

#[tokio::test]
async fn test_menu_reports_network_error() {
    let (app, _) = app_for(
        common::failing(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
        display(),
    )
    .await;

    let response = get(&app, "/", "test").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_index() {
    // Serve the real grid once, then fail: channel views must still resolve.
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let healthy = common::tvheadend(19, false);
    let flaky = Router::new().fallback({
        let calls = calls.clone();
        move |request: Request<Body>| {
            let calls = calls.clone();
            let healthy = healthy.clone();
            async move {
                let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if n < 2 {
                    healthy.oneshot(request).await.unwrap()
                } else {
                    axum::response::IntoResponse::into_response(StatusCode::SERVICE_UNAVAILABLE)
                }
            }
        }
    });
    let (app, _) = app_for(flaky, display()).await;

    assert_eq!(get(&app, "/", "test").await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/", "test").await.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        get(&app, "/channel/ch-five", "test").await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_unknown_route_and_metrics() {
    let (app, _) = app_for(common::tvheadend(19, false), display()).await;

    assert_eq!(
        get(&app, "/no/such/page", "test").await.status(),
        StatusCode::NOT_FOUND
    );

    assert_eq!(get(&app, "/", "test").await.status(), StatusCode::OK);
    let response = get(&app, "/metrics", "test").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("tvhguide_index_rebuilds_total"));
    assert!(text.contains("tvhguide_cached_channels"));
}
