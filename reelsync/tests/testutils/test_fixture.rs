//! Catalog fixture

use super::fake_remote::FakeRemote;
use reelsync::{ManualClock, MovieCatalog, ReelsyncConfig, StorageType};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// 2023-11-14T22:13:20Z
pub const START_MILLIS: i64 = 1_700_000_000_000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct TestFixture {
    pub catalog: MovieCatalog,
    pub remote: Arc<FakeRemote>,
    pub clock: Arc<ManualClock>,
    pub config: ReelsyncConfig,
    _dir: Option<TempDir>,
}

impl TestFixture {
    /// In-memory catalog; every listing has 5 pages of 20 movies
    pub fn new() -> Self {
        Self::with_config(Self::config(), Arc::new(FakeRemote::new(5, 20)))
    }

    pub fn config() -> ReelsyncConfig {
        let mut config = ReelsyncConfig::in_memory();
        config.default_language = "en".to_string();
        config.cache.ttl = Duration::from_secs(60);
        config.home.list_size = 10;
        config
    }

    pub fn with_config(config: ReelsyncConfig, remote: Arc<FakeRemote>) -> Self {
        init_logging();
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let catalog = MovieCatalog::open_with_clock(config.clone(), remote.clone(), clock.clone())
            .expect("Failed to open catalog");
        Self {
            catalog,
            remote,
            clock,
            config,
            _dir: None,
        }
    }

    /// Catalog on a sled database in a temporary directory
    pub fn on_disk() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let remote = Arc::new(FakeRemote::new(5, 20));
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let mut fixture = Self::open_at(&dir, remote, clock);
        fixture._dir = Some(dir);
        fixture
    }

    /// Catalog on the sled database under `dir`, sharing `remote` and `clock`
    pub fn open_at(dir: &TempDir, remote: Arc<FakeRemote>, clock: Arc<ManualClock>) -> Self {
        init_logging();
        let mut config = Self::config();
        config.storage.storage_type = StorageType::Sled;
        config.storage.path = dir.path().join("cache.db");
        let catalog = MovieCatalog::open_with_clock(config.clone(), remote.clone(), clock.clone())
            .expect("Failed to open catalog");
        Self {
            catalog,
            remote,
            clock,
            config,
            _dir: None,
        }
    }

    /// Move past the TTL of everything written so far
    pub fn expire(&self) {
        self.clock.advance(self.config.cache.ttl_millis() + 1);
    }
}
