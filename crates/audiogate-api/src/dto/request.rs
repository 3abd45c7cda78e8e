//! Query DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// `GET /?url=` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FetchQuery {
    /// Video page to pull the audio track from.
    #[validate(url(message = "url must be a valid URL"))]
    pub url: Option<String>,
}

/// `GET /download?token=` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DownloadQuery {
    /// Token returned by the fetch endpoint.
    #[validate(length(min = 1, message = "token must not be empty"))]
    pub token: Option<String>,
}
