//! In-memory token store.
//!
//! Single source of truth for the token → record mapping. Every operation
//! on one key is atomic with respect to every other operation on that key,
//! which is what lets request handlers and the sweeper share the store
//! without a global lock.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use audiogate_core::error::AppError;
use audiogate_core::result::AppResult;

use crate::record::TokenRecord;
use crate::token_prefix;

/// Concurrent token → record map. Nothing survives a restart.
#[derive(Debug)]
pub struct TokenStore {
    /// Live records keyed by token.
    records: DashMap<String, TokenRecord>,
    /// Validity window applied on insertion.
    ttl: TimeDelta,
}

impl TokenStore {
    /// Create an empty store whose records live for `ttl`.
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            records: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Validity window applied to new records.
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Insert a record expiring at `now + ttl`.
    ///
    /// A duplicate token is an internal invariant violation, as is an
    /// expiry past the end of the calendar.
    pub fn put(&self, token: &str, filename: &str, now: DateTime<Utc>) -> AppResult<()> {
        let record = TokenRecord::new(token, filename, now, self.ttl)?;
        match self.records.entry(token.to_string()) {
            Entry::Occupied(_) => Err(AppError::internal(format!(
                "Token {}... is already registered",
                token_prefix(token)
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Membership check. Ignores expiry.
    pub fn exists(&self, token: &str) -> bool {
        self.records.contains_key(token)
    }

    /// Clone of the record, expired or not.
    pub fn get(&self, token: &str) -> Option<TokenRecord> {
        self.records.get(token).map(|r| r.value().clone())
    }

    /// Remove a record unconditionally, returning its filename.
    pub fn remove(&self, token: &str) -> Option<String> {
        self.records.remove(token).map(|(_, r)| r.filename)
    }

    /// Remove a record only if it is still expired at `now`.
    pub fn remove_expired(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        self.records
            .remove_if(token, |_, r| r.is_expired_at(now))
            .map(|(_, r)| r.filename)
    }

    /// All `(token, filename)` pairs with `expires_at <= now`.
    pub fn snapshot_expired(&self, now: DateTime<Utc>) -> Vec<(String, String)> {
        self.records
            .iter()
            .filter(|r| r.value().is_expired_at(now))
            .map(|r| (r.key().clone(), r.value().filename.clone()))
            .collect()
    }

    /// Flip the consumed flag.
    ///
    /// Returns the updated record only for the caller that performed the
    /// transition; an unknown or already consumed token yields `None`.
    pub fn mark_consumed(&self, token: &str) -> Option<TokenRecord> {
        let mut record = self.records.get_mut(token)?;
        if record.consumed {
            return None;
        }
        record.consumed = true;
        Some(record.clone())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
