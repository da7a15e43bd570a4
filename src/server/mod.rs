use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::signal;
use tracing::{error, info};

use crate::config::Settings;
use crate::media::{
    DownloadResolution, MediaDescriptor, MediaError, MediaService, Platform, DEFAULT_QUALITY,
};

#[derive(Clone)]
struct AppState {
    service: Arc<MediaService>,
}

/// `url` is optional in the struct so a missing field maps to our own 400
/// instead of a framework rejection.
#[derive(Debug, Deserialize)]
struct DescribeRequest {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    url: Option<String>,
    quality: Option<String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub async fn run(settings: Settings) -> Result<()> {
    let state = AppState {
        service: Arc::new(MediaService::new(settings.cookies_base64.clone())),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/api/extract-info", post(extract_info))
        .route("/api/download", post(download))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!("API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("failed to install ctrl-c handler: {err}");
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "vidgrab API is running",
        "endpoints": {
            "extract_info": "/api/extract-info",
            "download": "/api/download",
        },
    }))
}

async fn extract_info(
    State(state): State<AppState>,
    Json(body): Json<DescribeRequest>,
) -> ApiResult<Json<MediaDescriptor>> {
    let url = require_url(body.url)?;
    let platform = Platform::classify(&url);

    match state.service.describe(platform, &url).await {
        Ok(descriptor) => Ok(Json(descriptor)),
        Err(err) => Err(media_failure(platform, describe_failure(platform), err)),
    }
}

async fn download(
    State(state): State<AppState>,
    Json(body): Json<DownloadRequest>,
) -> ApiResult<Json<DownloadResolution>> {
    let url = require_url(body.url)?;
    let quality = body.quality.unwrap_or_else(|| DEFAULT_QUALITY.to_string());
    let platform = Platform::classify(&url);

    match state.service.resolve(platform, &url, &quality).await {
        Ok(resolution) => Ok(Json(resolution)),
        Err(err) => Err(media_failure(platform, download_failure(platform), err)),
    }
}

fn require_url(url: Option<String>) -> ApiResult<String> {
    match url {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(ApiError::bad_request(MediaError::InvalidInput.to_string())),
    }
}

/// Map a media failure to a response. The original detail is only ever
/// logged; the client sees the operation's generic message. Resolver
/// failures are client errors on the Instagram path and server errors on
/// the YouTube-class path; extractor faults are server errors everywhere.
fn media_failure(platform: Platform, message: &str, err: MediaError) -> ApiError {
    error!("{message}: {err:#}");
    if !err.is_extraction_fault() && platform.failure_is_client_error() {
        ApiError::bad_request(message)
    } else {
        ApiError::internal(message)
    }
}

fn describe_failure(platform: Platform) -> &'static str {
    match platform {
        Platform::YoutubeClass => "Failed to process video",
        Platform::InstagramClass => "Failed to extract Instagram video info",
    }
}

fn download_failure(platform: Platform) -> &'static str {
    match platform {
        Platform::YoutubeClass => "Failed to get YouTube video URL",
        Platform::InstagramClass => "Failed to get Instagram video URL",
    }
}
