//! Token generation and registration.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, error, warn};

use audiogate_core::config::MIN_TOKEN_BYTES;
use audiogate_core::error::AppError;
use audiogate_core::result::AppResult;
use audiogate_core::traits::Clock;

use crate::store::TokenStore;
use crate::token_prefix;

/// Turns a freshly produced file into a time-boxed credential.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    /// Store that receives new records.
    store: Arc<TokenStore>,
    /// Time source for issuance.
    clock: Arc<dyn Clock>,
    /// Raw entropy per token, before encoding.
    token_bytes: usize,
}

impl TokenIssuer {
    /// Create a new issuer. `token_bytes` must be at least 16.
    pub fn new(
        store: Arc<TokenStore>,
        clock: Arc<dyn Clock>,
        token_bytes: usize,
    ) -> AppResult<Self> {
        if token_bytes < MIN_TOKEN_BYTES {
            return Err(AppError::configuration(format!(
                "Token length must be at least {MIN_TOKEN_BYTES} bytes, got {token_bytes}"
            )));
        }
        Ok(Self {
            store,
            clock,
            token_bytes,
        })
    }

    /// Issue a token for `filename` at the current time.
    pub fn issue(&self, filename: &str) -> AppResult<String> {
        self.issue_at(filename, self.clock.now())
    }

    /// Issue a token for `filename` as of `now`.
    pub fn issue_at(&self, filename: &str, now: DateTime<Utc>) -> AppResult<String> {
        self.register(filename, now, || self.generate())
    }

    /// Draw `token_bytes` from the OS CSPRNG and encode them URL-safe.
    fn generate(&self) -> String {
        let mut raw = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut raw);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Insert a generated token, retrying once on collision.
    fn register(
        &self,
        filename: &str,
        now: DateTime<Utc>,
        mut next: impl FnMut() -> String,
    ) -> AppResult<String> {
        let token = next();
        match self.store.put(&token, filename, now) {
            Ok(()) => {
                debug!(token = token_prefix(&token), filename, "Issued download token");
                return Ok(token);
            }
            // Only a collision is worth a second draw
            Err(e) if !self.store.exists(&token) => {
                error!(filename, error = %e, "Failed to register token");
                return Err(e);
            }
            Err(_) => {}
        }

        warn!(filename, "Token collision, regenerating");
        let token = next();
        match self.store.put(&token, filename, now) {
            Ok(()) => {
                debug!(token = token_prefix(&token), filename, "Issued download token");
                Ok(token)
            }
            Err(e) => {
                error!(filename, error = %e, "Token collision on retry");
                Err(e)
            }
        }
    }
}
