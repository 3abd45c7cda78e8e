//! The unit of access grant.

use chrono::{DateTime, Utc};

use audiogate_core::error::AppError;
use audiogate_core::result::AppResult;

/// A token and the single file it grants access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Opaque URL-safe credential.
    pub token: String,
    /// Backing file, relative to the downloads directory.
    pub filename: String,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// First instant at which the token is no longer valid.
    pub expires_at: DateTime<Utc>,
    /// Set once a single-use token has been redeemed.
    pub consumed: bool,
}

impl TokenRecord {
    /// Build a fresh record valid for `ttl` from `issued_at`.
    ///
    /// Fails when the expiry falls outside the representable date range.
    pub fn new(
        token: impl Into<String>,
        filename: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> AppResult<Self> {
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            AppError::internal(format!("Token expiry overflows: {issued_at} + {ttl}"))
        })?;
        Ok(Self {
            token: token.into(),
            filename: filename.into(),
            issued_at,
            expires_at,
            consumed: false,
        })
    }

    /// Expiry is inclusive: at `expires_at` the token is already dead.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
