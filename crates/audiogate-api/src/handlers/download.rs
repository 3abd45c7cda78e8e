//! Token-gated download handler.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use validator::Validate;

use audiogate_core::error::AppError;

use crate::dto::request::DownloadQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /download?token=...
pub async fn download_audio(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    query
        .validate()
        .map_err(|_| AppError::validation("Missing 'token' parameter."))?;
    let token = query
        .token
        .ok_or_else(|| AppError::validation("Missing 'token' parameter."))?;

    let download = state.downloads.open(&token).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.filename),
        )
        .header(header::CONTENT_LENGTH, download.size_bytes)
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
