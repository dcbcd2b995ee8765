//! App Core for LinkShelf.
//!
//! Central struct holding the shared storage and every manager built on it.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::database::Database;
use crate::managers::category_manager::CategoryManager;
use crate::managers::link_manager::LinkManager;
use crate::services::backup::BackupService;
use crate::services::clock::{Clock, SystemClock};
use crate::services::scheduler::{BackgroundScheduler, BadgeSink, SchedulerConfig, SharedBadge};
use crate::services::settings_manager::SettingsManager;
use crate::storage::Storage;

/// Central application struct. Managers are cheap handles onto the same
/// storage, so the scheduler can hold its own clones.
pub struct App {
    pub storage: Storage,
    pub links: LinkManager,
    pub categories: CategoryManager,
    pub settings: SettingsManager,
    pub backup: BackupService,
    /// Latest badge text, kept for `badge.get`.
    pub badge: SharedBadge,
}

impl App {
    /// Opens (or creates) the database at `db_path` and builds the managers.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open(db_path.as_ref())?;
        info!(path = %db_path.as_ref().display(), "database opened");
        Ok(Self::with_storage(Storage::sqlite(db), Arc::new(SystemClock)))
    }

    /// App over a non-persistent store.
    pub fn in_memory() -> Self {
        Self::with_storage(Storage::in_memory(), Arc::new(SystemClock))
    }

    pub fn with_storage(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self {
            links: LinkManager::with_clock(storage.clone(), clock.clone()),
            categories: CategoryManager::new(storage.clone()),
            settings: SettingsManager::new(storage.clone()),
            backup: BackupService::with_clock(storage.clone(), clock),
            badge: SharedBadge::new(),
            storage,
        }
    }

    /// Builds a scheduler over this app's storage. The app's [`SharedBadge`]
    /// is updated alongside `sink`.
    pub fn scheduler(&self, sink: Arc<dyn BadgeSink>, config: SchedulerConfig) -> BackgroundScheduler {
        let sink: Arc<dyn BadgeSink> = Arc::new(TeeBadge {
            shared: self.badge.clone(),
            inner: sink,
        });
        BackgroundScheduler::new(
            self.links.clone(),
            self.settings.clone(),
            self.storage.clone(),
            sink,
            config,
        )
    }
}

struct TeeBadge {
    shared: SharedBadge,
    inner: Arc<dyn BadgeSink>,
}

impl BadgeSink for TeeBadge {
    fn set_badge_text(&self, text: &str) {
        self.shared.set_badge_text(text);
        self.inner.set_badge_text(text);
    }
}
