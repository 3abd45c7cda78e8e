//! Fetch-and-issue handler.

use axum::Json;
use axum::extract::{Query, State};
use tracing::warn;
use validator::Validate;

use audiogate_core::error::AppError;

use crate::dto::request::FetchQuery;
use crate::dto::response::TokenResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /?url=...
///
/// Downloads the audio track and answers with a token for it.
pub async fn fetch_audio(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<TokenResponse>, ApiError> {
    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return Err(AppError::validation("Missing 'url' parameter.").into()),
    };
    query
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid 'url' parameter: {e}")))?;

    let filename = state.fetcher.fetch_audio(&url).await?;
    let token = match state.issuer.issue(&filename) {
        Ok(token) => token,
        Err(e) => {
            // No token will ever cover this file
            if let Err(del) = state.storage.delete(&filename).await {
                warn!(filename = %filename, error = %del, "Failed to remove unissued file");
            }
            return Err(e.into());
        }
    };

    Ok(Json(TokenResponse { token }))
}
