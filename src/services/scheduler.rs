//! Background scheduler.
//!
//! Runs the periodic housekeeping that keeps the collection tidy without
//! user action: the reminder badge refresh, the auto-archive sweep and the
//! trash purge. Storage writes to the link list trigger an extra badge
//! refresh so the badge follows edits made anywhere.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::managers::link_manager::LinkManager;
use crate::services::reminder_policy::badge_text;
use crate::services::settings_manager::{SettingsManager, SettingsManagerTrait};
use crate::storage::{keys, Storage, StorageChange};
use crate::types::config::HostConfig;
use crate::types::errors::SchedulerError;

/// How many days ahead of archiving a link is reported as archiving soon.
pub const ARCHIVE_WARNING_DAYS: u32 = 1;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Receives the badge text whenever it is recomputed. An empty string
/// clears the badge.
pub trait BadgeSink: Send + Sync {
    fn set_badge_text(&self, text: &str);
}

/// Badge sink that keeps the latest text for later reads.
#[derive(Clone, Default)]
pub struct SharedBadge {
    text: Arc<Mutex<String>>,
}

impl SharedBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl BadgeSink for SharedBadge {
    fn set_badge_text(&self, text: &str) {
        if let Ok(mut current) = self.text.lock() {
            *current = text.to_string();
        }
    }
}

/// Scheduler timing.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub badge_interval: Duration,
    pub sweep_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_host_config(&HostConfig::default())
    }
}

impl SchedulerConfig {
    pub fn from_host_config(config: &HostConfig) -> Self {
        Self {
            badge_interval: Duration::from_secs(config.badge_interval_secs.max(1)),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs.max(1)),
        }
    }
}

/// Event emitted by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    Started,
    /// The badge was recomputed.
    BadgeUpdated { count: usize },
    /// Inactive links were moved to the archive.
    ArchiveSwept { urls: Vec<String> },
    /// Links that will be archived within [`ARCHIVE_WARNING_DAYS`].
    ArchivingSoon { urls: Vec<String> },
    /// Expired links were removed from the trash.
    TrashPurged { removed: usize },
    /// A tick failed; the next tick runs as scheduled.
    TaskFailed { task: &'static str, error: String },
    Stopped,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub archived: Vec<String>,
    pub archiving_soon: Vec<String>,
    pub purged: usize,
}

/// Handle for controlling a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SchedulerEvent>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the scheduler to stop and waits for its loop to exit.
    pub async fn shutdown(self) -> Result<(), SchedulerError> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SchedulerError::Stopped)?;
        self.task
            .await
            .map_err(|e| SchedulerError::Task(e.to_string()))
    }

    /// Receiver for scheduler events, starting from the scheduler's start.
    pub fn events(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.event_rx.resubscribe()
    }
}

pub struct BackgroundScheduler {
    links: LinkManager,
    settings: SettingsManager,
    storage: Storage,
    sink: Arc<dyn BadgeSink>,
    config: SchedulerConfig,
    event_tx: broadcast::Sender<SchedulerEvent>,
}

impl BackgroundScheduler {
    pub fn new(
        links: LinkManager,
        settings: SettingsManager,
        storage: Storage,
        sink: Arc<dyn BadgeSink>,
        config: SchedulerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            links,
            settings,
            storage,
            sink,
            config,
            event_tx,
        }
    }

    /// Subscribes to events without starting the loop.
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.event_tx.subscribe()
    }

    /// Spawns the scheduler loop and returns a handle for control.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();
        let changes = self.storage.subscribe();

        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx, changes).await;
        });

        SchedulerHandle {
            shutdown_tx,
            event_rx,
            task,
        }
    }

    #[instrument(skip_all)]
    async fn run(
        &self,
        shutdown_rx: &mut mpsc::Receiver<()>,
        mut changes: broadcast::Receiver<StorageChange>,
    ) {
        info!(
            badge_interval_secs = self.config.badge_interval.as_secs(),
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            "scheduler started"
        );
        self.emit(SchedulerEvent::Started);

        self.badge_tick().await;
        self.sweep_tick().await;

        let mut badge_timer = interval_at(
            Instant::now() + self.config.badge_interval,
            self.config.badge_interval,
        );
        badge_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweep_timer = interval_at(
            Instant::now() + self.config.sweep_interval,
            self.config.sweep_interval,
        );
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("scheduler shutdown requested");
                    break;
                }
                _ = badge_timer.tick() => self.badge_tick().await,
                _ = sweep_timer.tick() => self.sweep_tick().await,
                change = changes.recv() => match change {
                    Ok(change) if change.key == keys::LINKS => self.badge_tick().await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "storage change stream lagged");
                        self.badge_tick().await;
                    }
                    Err(RecvError::Closed) => {
                        warn!("storage change stream closed");
                        break;
                    }
                },
            }
        }

        self.emit(SchedulerEvent::Stopped);
        info!("scheduler stopped");
    }

    async fn badge_tick(&self) {
        if let Err(e) = self.refresh_badge().await {
            error!(error = %e, "badge refresh failed");
            self.emit(SchedulerEvent::TaskFailed {
                task: "badge",
                error: e.to_string(),
            });
        }
    }

    async fn sweep_tick(&self) {
        if let Err(e) = self.run_sweep().await {
            error!(error = %e, "sweep failed");
            self.emit(SchedulerEvent::TaskFailed {
                task: "sweep",
                error: e.to_string(),
            });
        }
    }

    /// Recounts links needing attention and pushes the badge text.
    pub async fn refresh_badge(&self) -> Result<usize, SchedulerError> {
        let links = self.links.clone();
        let count = blocking(move || links.attention_count()).await??;
        self.sink.set_badge_text(&badge_text(count));
        debug!(count, "badge refreshed");
        self.emit(SchedulerEvent::BadgeUpdated { count });
        Ok(count)
    }

    /// Archives inactive links and purges expired trash, as enabled in the
    /// stored settings.
    pub async fn run_sweep(&self) -> Result<SweepReport, SchedulerError> {
        let links = self.links.clone();
        let settings = self.settings.clone();

        let report = blocking(move || -> Result<SweepReport, SchedulerError> {
            let archive = settings.archive_settings()?;
            let trash = settings.trash_settings()?;
            let mut report = SweepReport::default();

            if archive.auto_archive_enabled {
                report.archived =
                    links.archive_inactive(archive.archive_days, &archive.excluded_categories)?;
                report.archiving_soon = links
                    .archiving_soon(
                        archive.archive_days,
                        &archive.excluded_categories,
                        ARCHIVE_WARNING_DAYS,
                    )?
                    .into_iter()
                    .map(|l| l.url)
                    .collect();
            }
            if trash.auto_delete_enabled {
                report.purged = links.purge_expired_trash(trash.retention_days)?;
            }
            Ok(report)
        })
        .await??;

        if !report.archived.is_empty() {
            self.emit(SchedulerEvent::ArchiveSwept {
                urls: report.archived.clone(),
            });
        }
        if !report.archiving_soon.is_empty() {
            info!(count = report.archiving_soon.len(), "links archiving soon");
            self.emit(SchedulerEvent::ArchivingSoon {
                urls: report.archiving_soon.clone(),
            });
        }
        if report.purged > 0 {
            self.emit(SchedulerEvent::TrashPurged {
                removed: report.purged,
            });
        }
        debug!(
            archived = report.archived.len(),
            purged = report.purged,
            "sweep complete"
        );
        Ok(report)
    }

    fn emit(&self, event: SchedulerEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

/// Runs storage work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, SchedulerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SchedulerError::Task(e.to_string()))
}
