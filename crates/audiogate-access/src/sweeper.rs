//! Background reclamation of expired tokens and their backing files.
//!
//! Each cycle removes the token first, which is the point access is cut
//! off, then deletes the file on a best-effort basis. A failed delete is
//! reported and never resurrects the token.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use audiogate_core::error::ErrorKind;
use audiogate_core::traits::Clock;
use audiogate_core::traits::storage::StorageProvider;

use crate::store::TokenStore;
use crate::token_prefix;

/// Outcome of one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Records found expired in the snapshot.
    pub expired: usize,
    /// Records actually removed from the store.
    pub reclaimed: usize,
    /// Backing files that could not be deleted.
    pub file_errors: usize,
}

/// Periodically prunes expired tokens and deletes their files.
#[derive(Debug)]
pub struct ExpirationSweeper {
    store: Arc<TokenStore>,
    storage: Arc<dyn StorageProvider>,
    clock: Arc<dyn Clock>,
    /// Pause between cycles.
    interval: Duration,
}

impl ExpirationSweeper {
    /// Create a new sweeper.
    pub fn new(
        store: Arc<TokenStore>,
        storage: Arc<dyn StorageProvider>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            storage,
            clock,
            interval,
        }
    }

    /// Run one sweep cycle against the current time.
    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.clock.now();
        let expired = self.store.snapshot_expired(now);

        let mut report = SweepReport {
            expired: expired.len(),
            ..SweepReport::default()
        };
        if expired.is_empty() {
            return report;
        }

        for (token, _) in &expired {
            // Re-checked under the entry lock
            let Some(filename) = self.store.remove_expired(token, now) else {
                continue;
            };
            report.reclaimed += 1;

            match self.storage.delete(&filename).await {
                Ok(()) => {
                    debug!(token = token_prefix(token), filename = %filename, "Reclaimed token");
                }
                Err(e) if e.is(ErrorKind::NotFound) => {
                    report.file_errors += 1;
                    warn!(
                        token = token_prefix(token),
                        filename = %filename,
                        "Backing file already gone"
                    );
                }
                Err(e) => {
                    report.file_errors += 1;
                    error!(
                        token = token_prefix(token),
                        filename = %filename,
                        error = %e,
                        "Failed to delete backing file"
                    );
                }
            }
        }

        info!(
            expired = report.expired,
            reclaimed = report.reclaimed,
            file_errors = report.file_errors,
            "Sweep cycle complete"
        );
        report
    }

    /// Sweep, then sleep for the interval, until `cancel` turns true or its
    /// sender is dropped. A cycle in progress always runs to completion.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "Expiration sweeper started"
        );

        'cycles: loop {
            if *cancel.borrow() {
                break;
            }

            self.sweep_once().await;

            let sleep = time::sleep(self.interval);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => continue 'cycles,
                    changed = cancel.changed() => {
                        if changed.is_err() || *cancel.borrow() {
                            break 'cycles;
                        }
                    }
                }
            }
        }

        info!("Expiration sweeper stopped");
    }

    /// Start the sweeper on the runtime. This is the process-lifetime
    /// entry point; the returned handle completes after cancellation.
    pub fn spawn(self: Arc<Self>, cancel: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}
