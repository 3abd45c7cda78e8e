//! # audiogate-access
//!
//! Time-boxed, token-gated access to downloaded audio files.
//!
//! ## Modules
//!
//! - `record`: the `TokenRecord` access grant
//! - `store`: concurrent token → record map
//! - `issuer`: CSPRNG token generation and registration
//! - `validator`: existence, freshness, and file resolution checks
//! - `download`: authorize a token, confirm its file, open the stream
//! - `sweeper`: background reclamation of expired tokens and their files

pub mod download;
pub mod issuer;
pub mod record;
pub mod store;
pub mod sweeper;
pub mod validator;

pub use download::{AudioDownload, DownloadService};
pub use issuer::TokenIssuer;
pub use record::TokenRecord;
pub use store::TokenStore;
pub use sweeper::{ExpirationSweeper, SweepReport};
pub use validator::AccessValidator;

/// Shortened form of a token that is safe to put in logs.
pub(crate) fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
