//! Decides whether a presented token may be used right now.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use audiogate_core::error::AppError;
use audiogate_core::result::AppResult;
use audiogate_core::traits::Clock;

use crate::record::TokenRecord;
use crate::store::TokenStore;

/// Read-only view over the token store answering existence, freshness and
/// file-mapping questions.
#[derive(Debug, Clone)]
pub struct AccessValidator {
    store: Arc<TokenStore>,
    clock: Arc<dyn Clock>,
    /// Whether a redeemed token stays usable.
    single_use: bool,
}

impl AccessValidator {
    /// Create a validator over `store`.
    pub fn new(store: Arc<TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            single_use: false,
        }
    }

    /// Reject tokens that have already been redeemed.
    pub fn with_single_use(mut self, single_use: bool) -> Self {
        self.single_use = single_use;
        self
    }

    /// Whether consumed tokens are rejected.
    pub fn single_use(&self) -> bool {
        self.single_use
    }

    /// True if the token was issued and has not been reclaimed yet.
    pub fn has_access(&self, token: &str) -> bool {
        self.store.exists(token)
    }

    /// True iff the token exists and the clock is before its deadline.
    pub fn is_valid(&self, token: &str) -> bool {
        self.is_valid_at(token, self.clock.now())
    }

    /// [`is_valid`](Self::is_valid) against an explicit instant.
    pub fn is_valid_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.store
            .get(token)
            .is_some_and(|r| !r.is_expired_at(now))
    }

    /// Filename mapped to `token`.
    pub fn resolve_file(&self, token: &str) -> AppResult<String> {
        self.store
            .get(token)
            .map(|r| r.filename)
            .ok_or_else(|| AppError::unauthorized("Invalid token."))
    }

    /// Apply the full check order from one consistent read of the record:
    /// unknown, then expired, then consumed.
    pub fn authorize(&self, token: &str) -> AppResult<TokenRecord> {
        let record = self
            .store
            .get(token)
            .ok_or_else(|| AppError::unauthorized("Invalid token."))?;

        if record.is_expired_at(self.clock.now()) {
            return Err(AppError::expired("Token has expired."));
        }
        if self.single_use && record.consumed {
            return Err(AppError::gone("Token has already been used."));
        }
        Ok(record)
    }
}
