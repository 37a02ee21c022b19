pub mod backend;
pub mod channels;
pub mod config;
pub mod index;
pub mod metrics;
pub mod session;
pub mod setup;
pub mod stream;
pub mod view;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use backend::{BackendClient, BackendError};
use chrono::{Local, Utc};
use index::IndexOptions;
use serde::Serialize;
use session::SessionStore;
use std::sync::Arc;
use tracing::info;
use view::{ChannelView, ClientPlatform, DisplayOptions, RenderContext, RenderError};

struct AppState {
    client: BackendClient,
    sessions: SessionStore,
    index_options: IndexOptions,
    display: DisplayOptions,
}

/// Lightweight menu entry; the full view lives behind `key`.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MenuEntry {
    pub uuid: String,
    pub number: f64,
    pub name: String,
    pub key: String,
    pub stream_key: String,
}

#[derive(Debug, Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub header: String,
    pub message: String,
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match self {
            BackendError::Auth(_) => StatusCode::UNAUTHORIZED,
            BackendError::Network(_) => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            header: "Error".to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            header: "Not found".to_string(),
            message: self.to_string(),
        };
        (StatusCode::NOT_FOUND, Json(body)).into_response()
    }
}

pub fn create_app(
    client: BackendClient,
    index_options: IndexOptions,
    display: DisplayOptions,
) -> Router {
    let state = Arc::new(AppState {
        client,
        sessions: SessionStore::new(),
        index_options,
        display,
    });

    Router::new()
        .route("/", get(menu_handler))
        .route("/channel/{uuid}", get(channel_handler))
        .route("/channel/{uuid}/livestream", get(stream_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(fallback_handler)
        .with_state(state)
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<none>")
}

async fn fallback_handler(method: Method, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    info!(
        "HTTP 404: method={} uri={} UA=\"{}\"",
        method,
        uri,
        user_agent(&headers)
    );
    (StatusCode::NOT_FOUND, "Not found")
}

async fn menu_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<MenuEntry>>, BackendError> {
    info!("HTTP menu request: UA=\"{}\"", user_agent(&headers));

    let index = state
        .sessions
        .rebuild(&state.client, &state.index_options, Utc::now().timestamp())
        .await?;

    let entries = index
        .channels()
        .iter()
        .map(|channel| MenuEntry {
            uuid: channel.uuid.clone(),
            number: channel.number,
            name: channel.name.clone(),
            key: format!("/channel/{}", channel.uuid),
            stream_key: format!("/channel/{}/livestream", channel.uuid),
        })
        .collect();

    Ok(Json(entries))
}

async fn channel_handler(
    Path(uuid): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ChannelView>, RenderError> {
    let ua = user_agent(&headers);
    info!("HTTP channel request: uuid={} UA=\"{}\"", uuid, ua);

    let Some(index) = state.sessions.current().await else {
        return Err(RenderError::NotFound(uuid));
    };

    let ctx = RenderContext {
        base_url: state.client.base_url(),
        display: state.display,
        platform: ClientPlatform::from_user_agent(ua),
    };
    let view = view::render_channel(&index, &uuid, &Local::now(), &ctx)?;
    Ok(Json(view))
}

async fn stream_handler(
    Path(uuid): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Redirect {
    let url = stream::resolve_stream_url(state.client.base_url(), &uuid);
    info!(
        "HTTP stream request: uuid={} -> {} UA=\"{}\"",
        uuid,
        url,
        user_agent(&headers)
    );
    Redirect::temporary(url.as_str())
}

async fn metrics_handler() -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}
