//! Drive streaming proxy
//!
//! `GET /api/proxy/:id` serves Drive audio and images from the same origin
//! as the player. Audio honors `Range: bytes=S-E` with 206 responses so the
//! browser can seek without downloading the whole file.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use std::future::Future;
use hymnal_common::naming::is_valid_file_id;
use tracing::{debug, error, warn};

use crate::drive::{ByteRange, DriveError, DriveFile, DriveStore};
use crate::{ApiError, ApiResult, AppState};

/// Cache policy for complete (non-range) responses
const FULL_RESPONSE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// GET /api/proxy/:id
pub async fn proxy_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let file_id = file_id.trim().to_string();
    if file_id.is_empty() {
        return Err(ApiError::BadRequest("File ID is required".to_string()));
    }
    if !is_valid_file_id(&file_id) {
        warn!("Rejected proxy request for malformed file ID {:?}", file_id);
        return Err(ApiError::BadRequest("Invalid file ID".to_string()));
    }

    let range_header = match headers.get(header::RANGE) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::BadRequest("Invalid Range header".to_string()))?
                .to_string(),
        ),
        None => None,
    };

    let drive = state.drive.as_ref();
    let mut retry = RetryBudget::default();

    let file = retry
        .run(drive, || drive.metadata(&file_id))
        .await
        .map_err(proxy_error)?;

    if !file.is_audio() && !file.is_image() {
        return Err(ApiError::BadRequest(format!(
            "Unsupported file type: {}",
            file.mime_type
        )));
    }

    let range = requested_range(&file, range_header.as_deref());
    let stream = retry
        .run(drive, || drive.media(&file_id, range))
        .await
        .map_err(proxy_error)?;

    build_response(&file, range, Body::from_stream(stream))
}

/// Range applied to the response: audio only, and only when it fits the file
fn requested_range(file: &DriveFile, range_header: Option<&str>) -> Option<ByteRange> {
    if !file.is_audio() {
        return None;
    }
    let (header, size) = (range_header?, file.size?);
    let range = ByteRange::parse(header, size);
    if range.is_none() {
        debug!("Ignoring unsatisfiable range {:?} for {} ({} bytes)", header, file.id, size);
    }
    range
}

fn build_response(file: &DriveFile, range: Option<ByteRange>, body: Body) -> ApiResult<Response> {
    let mut builder = Response::builder().header(header::CONTENT_TYPE, file.mime_type.as_str());
    if file.is_audio() {
        builder = builder.header(header::ACCEPT_RANGES, "bytes");
    }

    builder = match (range, file.size) {
        (Some(range), Some(size)) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, range.content_range(size))
            .header(header::CONTENT_LENGTH, range.content_length()),
        (_, size) => {
            let builder = builder
                .status(StatusCode::OK)
                .header(header::CACHE_CONTROL, FULL_RESPONSE_CACHE_CONTROL);
            match size.filter(|s| *s > 0) {
                Some(size) => builder.header(header::CONTENT_LENGTH, size),
                None => builder,
            }
        }
    };

    builder
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

fn proxy_error(err: DriveError) -> ApiError {
    match err {
        DriveError::NotFound(id) => ApiError::NotFound(format!("File not found: {}", id)),
        other => {
            error!("Proxy error: {}", other);
            ApiError::Proxy(other.to_string())
        }
    }
}

/// Allows one credential refresh per proxied request
#[derive(Debug, Default)]
struct RetryBudget {
    refreshed: bool,
}

impl RetryBudget {
    /// Run `op`; on an expired-token error refresh once and run it again
    async fn run<T, F, Fut>(&mut self, drive: &dyn DriveStore, op: F) -> Result<T, DriveError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, DriveError>>,
    {
        match op().await {
            Err(err) if err.is_auth_expired() && !self.refreshed => {
                warn!("Drive rejected access token ({}); refreshing and retrying", err);
                self.refreshed = true;
                drive.refresh_credentials().await?;
                op().await
            }
            result => result,
        }
    }
}
