//! HTTP server for the interactive variant.
//!
//! The client posts CSV content directly instead of pointing at a file.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                                |
//! |--------|---------------|--------------------------------------------|
//! | GET    | `/health`     | Health check                               |
//! | GET    | `/api/config` | Current config, API key masked             |
//! | PUT    | `/api/config` | Replace the config file                    |
//! | POST   | `/api/sync`   | Sync CSV text or a multipart `file` field  |
//! | GET    | `/api/logs`   | SSE stream for real-time logs              |
//!
//! `POST /api/sync` takes `?dryRun=true` and `?delimiter=auto|tab|<char>`.

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, SyncQuery, SyncResponse};
use crate::config::SyncConfig;
use crate::error::{ConfigError, SyncError};
use crate::sync::sync_csv_content;

type ApiError = (StatusCode, Json<Value>);

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Config file read on every sync and written by `PUT /api/config`
    pub config_path: PathBuf,
}

/// Build the router. Split from [`start_server`] so it can be served elsewhere.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/config", get(get_config).put(update_config))
        .route("/api/sync", post(sync_request))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn start_server(port: u16, config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState { config_path });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Listload server running on http://localhost:{}", port);
    println!("   GET  /api/config - Show config");
    println!("   PUT  /api/config - Update config");
    println!("   POST /api/sync   - Sync CSV content or file");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "listload",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers just miss entries.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Current config; an absent file reads as empty.
async fn get_config(State(state): State<Arc<AppState>>) -> Result<Json<SyncConfig>, ApiError> {
    let config = match SyncConfig::from_file(&state.config_path) {
        Ok(config) => config,
        Err(ConfigError::Unreadable { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            SyncConfig::default()
        }
        Err(e) => return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
    };
    Ok(Json(config.masked()))
}

/// Replace the config file. A masked key sent back unchanged keeps the stored key.
async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(mut config): Json<SyncConfig>,
) -> Result<Json<SyncConfig>, ApiError> {
    if config.api_key.starts_with("****") {
        let stored = SyncConfig::from_file(&state.config_path)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;
        config.api_key = stored.api_key;
    }

    config
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;
    config
        .save(&state.config_path)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?;

    Ok(Json(config.masked()))
}

/// Sync CSV sent as the request body, or as multipart field `file`
async fn sync_request(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncQuery>,
    request: Request,
) -> Result<Json<SyncResponse>, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let content = if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?;
        read_file_field(multipart).await?
    } else {
        String::from_request(request, &())
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.body_text()))?
    };

    run(&state, &query, &content).await
}

/// Decoded contents of multipart field `file`
async fn read_file_field(mut multipart: Multipart) -> Result<String, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, &format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No file provided"))?;
    let encoding = crate::parser::detect_encoding(&bytes);
    Ok(crate::parser::decode_content(&bytes, &encoding))
}

async fn run(state: &AppState, query: &SyncQuery, content: &str) -> Result<Json<SyncResponse>, ApiError> {
    if content.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "empty CSV content"));
    }

    let config = SyncConfig::load(&state.config_path).map_err(|e| {
        let err = SyncError::from(e);
        api_error(status_for(&err), &err.to_string())
    })?;

    let mode = query.mode();
    let report = sync_csv_content(&config, content, query.delimiter, mode)
        .await
        .map_err(|e| api_error(status_for(&e), &e.to_string()))?;

    Ok(Json(SyncResponse::completed(report, mode)))
}

fn status_for(err: &SyncError) -> StatusCode {
    match err {
        SyncError::Parse(_) => StatusCode::BAD_REQUEST,
        SyncError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::Remote(_) => StatusCode::BAD_GATEWAY,
    }
}

fn api_error(status: StatusCode, message: &str) -> ApiError {
    log_error(message);
    (status, Json(error_response(message)))
}
