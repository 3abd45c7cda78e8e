//! Integration tests for the token lifecycle: issue, validate, sweep.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use audiogate_access::{AccessValidator, DownloadService, ExpirationSweeper, TokenIssuer};
use audiogate_core::error::ErrorKind;
use audiogate_core::result::AppResult;
use audiogate_core::traits::storage::{ByteStream, StorageObjectMeta};
use audiogate_core::traits::{Clock, ManualClock, StorageProvider};
use audiogate_storage::{LocalStorageProvider, OrphanPurge};

fn write(app: &helpers::TestApp, name: &str) {
    std::fs::write(app.file_path(name), b"ID3").unwrap();
}

#[tokio::test]
async fn test_scenario_a_issue_validate_sweep() {
    let app = helpers::TestApp::new().await;
    write(&app, "a1b2.mp3");
    let validator = AccessValidator::new(app.store.clone(), app.clock.clone());

    let token = app.issuer.issue("a1b2.mp3").unwrap();
    assert!(validator.has_access(&token));
    assert_eq!(validator.resolve_file(&token).unwrap(), "a1b2.mp3");

    app.advance(10);
    assert!(validator.is_valid(&token));
    assert_eq!(validator.resolve_file(&token).unwrap(), "a1b2.mp3");

    app.advance(51);
    assert!(!validator.is_valid(&token));
    app.sweeper.sweep_once().await;

    assert!(!validator.has_access(&token));
    assert!(!app.file_path("a1b2.mp3").exists());
}

#[tokio::test]
async fn test_scenario_b_never_issued() {
    let app = helpers::TestApp::new().await;
    let validator = AccessValidator::new(app.store.clone(), app.clock.clone());

    assert!(!validator.has_access("bogus"));
    let err = validator.authorize("bogus").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_scenario_c_same_instant_tokens_resolve_independently() {
    let app = helpers::TestApp::new().await;
    let validator = AccessValidator::new(app.store.clone(), app.clock.clone());
    let now = app.clock.now();

    let first = app.issuer.issue_at("one.mp3", now).unwrap();
    let second = app.issuer.issue_at("two.mp3", now).unwrap();

    assert_ne!(first, second);
    assert_eq!(validator.resolve_file(&first).unwrap(), "one.mp3");
    assert_eq!(validator.resolve_file(&second).unwrap(), "two.mp3");
}

#[tokio::test]
async fn test_scenario_d_missing_file_does_not_stop_sweep() {
    let app = helpers::TestApp::new().await;
    write(&app, "b.mp3");
    write(&app, "c.mp3");

    let a = app.issuer.issue("a.mp3").unwrap(); // never written
    let b = app.issuer.issue("b.mp3").unwrap();
    let c = app.issuer.issue("c.mp3").unwrap();
    app.advance(60);

    let report = app.sweeper.sweep_once().await;
    assert_eq!(report.expired, 3);
    assert_eq!(report.reclaimed, 3);
    assert_eq!(report.file_errors, 1);

    for token in [&a, &b, &c] {
        assert!(!app.store.exists(token));
    }
    assert!(!app.file_path("b.mp3").exists());
    assert!(!app.file_path("c.mp3").exists());
}

#[tokio::test]
async fn test_sweep_never_reclaims_live_tokens() {
    let app = helpers::TestApp::new().await;

    let mut live = Vec::new();
    for i in 0..20 {
        let name = format!("{i}.mp3");
        write(&app, &name);
        live.push((app.issuer.issue(&name).unwrap(), name));
        app.advance(1);
    }

    // Oldest was issued 20s ago, youngest 1s ago
    for _ in 0..5 {
        let report = app.sweeper.sweep_once().await;
        assert_eq!(report.reclaimed, 0);
    }
    for (token, name) in &live {
        assert!(app.store.exists(token));
        assert!(app.file_path(name).exists());
    }

    // Now t=20; at t=69 exactly the first ten (issued t=0..9) are due
    app.advance(49);
    let report = app.sweeper.sweep_once().await;
    assert_eq!(report.reclaimed, 10);
    for (i, (token, _)) in live.iter().enumerate() {
        assert_eq!(app.store.exists(token), i >= 10, "token #{i}");
    }
}

#[tokio::test]
async fn test_ten_thousand_issued_tokens_are_unique() {
    let app = helpers::TestApp::with_config(|c| c.access.token_bytes = 16).await;
    let issuer = app.issuer.clone();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let issuer = issuer.clone();
            tokio::spawn(async move {
                (0..2_500)
                    .map(|i| issuer.issue(&format!("{worker}-{i}.mp3")).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for token in handle.await.unwrap() {
            assert!(seen.insert(token), "duplicate token issued");
        }
    }
    assert_eq!(seen.len(), 10_000);
    assert_eq!(app.store.len(), 10_000);
}

#[tokio::test]
async fn test_spawned_sweeper_reclaims_and_stops() {
    let app = helpers::TestApp::with_config(|c| c.access.sweep_interval_seconds = 1).await;
    write(&app, "a.mp3");
    let token = app.issuer.issue("a.mp3").unwrap();
    app.advance(60);

    let (tx, rx) = watch::channel(false);
    let handle = app.sweeper.clone().spawn(rx);

    let mut reclaimed = false;
    for _ in 0..50 {
        if !app.store.exists(&token) {
            reclaimed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(reclaimed, "sweeper never reclaimed the expired token");
    assert!(!app.file_path("a.mp3").exists());

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("sweeper did not stop")
        .unwrap();
}

/// Storage whose `metadata` lets the sweeper run first, reproducing a
/// reclaim that lands between validation and streaming.
#[derive(Debug)]
struct RacingStorage {
    inner: Arc<LocalStorageProvider>,
    sweeper: std::sync::OnceLock<Arc<ExpirationSweeper>>,
}

#[async_trait]
impl StorageProvider for RacingStorage {
    fn provider_type(&self) -> &str {
        "racing"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, data: bytes::Bytes) -> AppResult<()> {
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        self.inner.exists(path).await
    }

    async fn metadata(&self, path: &str) -> AppResult<StorageObjectMeta> {
        if let Some(sweeper) = self.sweeper.get() {
            sweeper.sweep_once().await;
        }
        self.inner.metadata(path).await
    }

    async fn list(&self) -> AppResult<Vec<StorageObjectMeta>> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn test_file_reclaimed_between_validation_and_stream_is_not_found() {
    let app = helpers::TestApp::new().await;
    write(&app, "race.mp3");

    // The request sees t=59, the sweeper already runs at t=61
    let request_clock = app.clock.clone();
    let sweep_clock = Arc::new(ManualClock::new(request_clock.now()));

    let racing = Arc::new(RacingStorage {
        inner: app.storage.clone(),
        sweeper: std::sync::OnceLock::new(),
    });
    let sweeper = Arc::new(ExpirationSweeper::new(
        app.store.clone(),
        racing.clone(),
        sweep_clock.clone(),
        Duration::from_secs(10),
    ));
    racing.sweeper.set(sweeper).unwrap();

    let issuer = TokenIssuer::new(app.store.clone(), request_clock.clone(), 32).unwrap();
    let token = issuer.issue("race.mp3").unwrap();

    request_clock.advance(chrono::Duration::seconds(59));
    sweep_clock.advance(chrono::Duration::seconds(61));

    let validator = AccessValidator::new(app.store.clone(), request_clock.clone());
    let downloads = DownloadService::new(validator, app.store.clone(), racing.clone());

    let err = downloads.open(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(!app.store.exists(&token));
    assert!(!app.file_path("race.mp3").exists());
}

#[tokio::test]
async fn test_orphan_purge_clears_previous_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("left-over.mp3"), b"x").unwrap();

    let storage = Arc::new(
        LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap(),
    );
    let purged = OrphanPurge::new(storage.clone()).purge_orphans().await.unwrap();

    assert_eq!(purged, 1);
    assert!(storage.list().await.unwrap().is_empty());
}
