#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tvhguide::backend::{BackendClient, Credentials};
use url::Url;

pub const USER: &str = "user";
pub const PASSWORD: &str = "pass";
/// `Basic base64("user:pass")`
pub const EXPECTED_AUTH: &str = "Basic dXNlcjpwYXNz";

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

pub fn client(url: Url) -> BackendClient {
    BackendClient::new(url, None, Duration::from_secs(5)).unwrap()
}

pub fn client_with_auth(url: Url) -> BackendClient {
    let credentials = Credentials {
        username: USER.to_string(),
        password: PASSWORD.to_string(),
    };
    BackendClient::new(url, Some(&credentials), Duration::from_secs(5)).unwrap()
}

/// A router answering every request with `status` and `body`.
pub fn failing(status: StatusCode, body: &'static str) -> Router {
    Router::new().fallback(move || async move { (status, body) })
}

fn authorized(headers: &HeaderMap, require_auth: bool) -> bool {
    if !require_auth {
        return true;
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(EXPECTED_AUTH)
}

/// Minimal Tvheadend: four channels out of numeric order, an EPG grid with
/// two events for channel five and one event for a channel that does not exist.
pub fn tvheadend(api_version: u64, require_auth: bool) -> Router {
    Router::new()
        .route(
            "/api/serverinfo",
            get(move |headers: HeaderMap| async move {
                if !authorized(&headers, require_auth) {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                Json(json!({
                    "api_version": api_version,
                    "sw_version": "4.2.8",
                    "name": "Tvheadend",
                }))
                .into_response()
            }),
        )
        .route(
            "/api/channel/grid",
            get(
                move |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                    if !authorized(&headers, require_auth) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    if query.get("start").map(String::as_str) != Some("0")
                        || query.get("limit").map(String::as_str) != Some("999999")
                    {
                        return StatusCode::BAD_REQUEST.into_response();
                    }
                    channel_grid()
                },
            ),
        )
        .route(
            "/api/epg/events/grid",
            get(
                move |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                    if !authorized(&headers, require_auth) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    // One event per channel is requested.
                    if query.get("limit").map(String::as_str) != Some("4") {
                        return StatusCode::BAD_REQUEST.into_response();
                    }
                    epg_grid()
                },
            ),
        )
}

fn channel_grid() -> Response {
    Json(json!({
        "entries": [
            {"uuid": "ch-ten", "number": 10, "name": "Ten", "icon_public_url": "imagecache/10"},
            {"uuid": "ch-five-one", "number": 5.1, "name": "Five Plus"},
            {"uuid": "ch-five", "number": 5, "name": "Five", "icon_public_url": "https://logos.example/five.png"},
            {"uuid": "ch-six", "number": 6, "name": "Six"}
        ],
        "total": 4
    }))
    .into_response()
}

fn epg_grid() -> Response {
    let now = chrono::Utc::now().timestamp();
    Json(json!({
        "entries": [
            {"channelUuid": "ch-five", "title": "News", "description": "Headlines", "start": now - 600, "stop": now + 3000},
            {"channelUuid": "ch-five", "title": "Later", "start": now + 3000, "stop": now + 6600},
            {"channelUuid": "ch-gone", "title": "Orphan", "start": now - 600, "stop": now + 3000},
            {"channelUuid": "ch-ten", "title": "Movie", "start": now - 3600, "stop": now + 3600}
        ],
        "total": 4
    }))
    .into_response()
}
