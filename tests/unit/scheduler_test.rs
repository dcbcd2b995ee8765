//! Tests for the background scheduler: badge refresh, sweeps, the storage
//! change trigger and failure handling.

use std::sync::Arc;
use std::time::Duration;

use linkshelf::managers::link_manager::{LinkManager, LinkManagerTrait};
use linkshelf::services::clock::ManualClock;
use linkshelf::services::scheduler::{
    BackgroundScheduler, SchedulerConfig, SchedulerEvent, SharedBadge,
};
use linkshelf::services::settings_manager::{SettingsManager, SettingsManagerTrait};
use linkshelf::storage::{MemoryBackend, Storage};
use linkshelf::types::link::{DuplicatePolicy, SavedLink, DAY_MS};
use linkshelf::types::settings::{ArchiveSettings, TrashSettings};
use tokio::sync::broadcast;
use tokio::time::timeout;

const T0: i64 = 1_700_000_000_000;

struct Fixture {
    scheduler: BackgroundScheduler,
    links: LinkManager,
    settings: SettingsManager,
    clock: ManualClock,
    badge: SharedBadge,
    backend: Arc<MemoryBackend>,
}

fn setup() -> Fixture {
    let backend = Arc::new(MemoryBackend::new());
    let storage = Storage::from_arc(backend.clone());
    let clock = ManualClock::new(T0);
    let links = LinkManager::with_clock(storage.clone(), Arc::new(clock.clone()));
    let settings = SettingsManager::new(storage.clone());
    let badge = SharedBadge::new();
    let scheduler = BackgroundScheduler::new(
        links.clone(),
        settings.clone(),
        storage,
        Arc::new(badge.clone()),
        SchedulerConfig::default(),
    );
    Fixture { scheduler, links, settings, clock, badge, backend }
}

fn save(links: &LinkManager, url: &str, timestamp: i64, reminder_days: Option<u32>) {
    let mut link = SavedLink::new(url, url, "", timestamp);
    link.reminder_days = reminder_days;
    links.save_link(link, DuplicatePolicy::Overwrite).unwrap();
}

/// Waits for the first event matching `pred`.
async fn wait_for(
    events: &mut broadcast::Receiver<SchedulerEvent>,
    pred: impl Fn(&SchedulerEvent) -> bool,
) -> SchedulerEvent {
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for scheduler event")
}

// ─── Direct calls ───

#[tokio::test]
async fn test_refresh_badge_counts_links_needing_attention() {
    let f = setup();
    save(&f.links, "https://due.example", T0, Some(3));
    save(&f.links, "https://fresh.example", T0, Some(30));
    save(&f.links, "https://none.example", T0, None);
    f.clock.advance_days(5);

    assert_eq!(f.scheduler.refresh_badge().await.unwrap(), 1);
    assert_eq!(f.badge.text(), "1");
}

#[tokio::test]
async fn test_zero_count_clears_badge() {
    let f = setup();
    assert_eq!(f.scheduler.refresh_badge().await.unwrap(), 0);
    assert_eq!(f.badge.text(), "");
}

#[tokio::test]
async fn test_trashed_links_do_not_count_toward_badge() {
    let f = setup();
    save(&f.links, "https://due.example", T0, Some(1));
    f.clock.advance_days(2);
    f.links.move_to_trash("https://due.example").unwrap();
    assert_eq!(f.scheduler.refresh_badge().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sweep_archives_warns_and_purges() {
    let f = setup();
    save(&f.links, "https://stale.example", T0, None);
    save(&f.links, "https://nearly.example", T0 + 2 * DAY_MS - 1, None);
    save(&f.links, "https://trashed.example", T0, None);
    f.links.move_to_trash("https://trashed.example").unwrap();

    f.clock.advance_days(31);
    let mut events = f.scheduler.subscribe();
    let report = f.scheduler.run_sweep().await.unwrap();

    assert_eq!(report.archived, vec!["https://stale.example".to_string()]);
    assert_eq!(report.archiving_soon, vec!["https://nearly.example".to_string()]);
    assert_eq!(report.purged, 1);

    let stale = f.links.get_link("https://stale.example").unwrap().unwrap();
    assert_eq!(stale.archived_at, Some(T0 + 31 * DAY_MS));
    assert!(f.links.get_link("https://trashed.example").unwrap().is_none());

    assert_eq!(
        events.try_recv().unwrap(),
        SchedulerEvent::ArchiveSwept { urls: vec!["https://stale.example".to_string()] }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        SchedulerEvent::ArchivingSoon { urls: vec!["https://nearly.example".to_string()] }
    );
    assert_eq!(events.try_recv().unwrap(), SchedulerEvent::TrashPurged { removed: 1 });
}

#[tokio::test]
async fn test_sweep_respects_disabled_settings() {
    let f = setup();
    f.settings
        .set_archive_settings(&ArchiveSettings { auto_archive_enabled: false, ..ArchiveSettings::default() })
        .unwrap();
    f.settings
        .set_trash_settings(&TrashSettings { auto_delete_enabled: false, ..TrashSettings::default() })
        .unwrap();
    save(&f.links, "https://stale.example", T0, None);
    save(&f.links, "https://trashed.example", T0, None);
    f.links.move_to_trash("https://trashed.example").unwrap();

    f.clock.advance_days(60);
    let report = f.scheduler.run_sweep().await.unwrap();
    assert!(report.archived.is_empty());
    assert_eq!(report.purged, 0);
    assert_eq!(f.links.get_all_links().unwrap().len(), 2);
}

#[tokio::test]
async fn test_sweep_uses_stored_archive_days() {
    let f = setup();
    f.settings
        .set_archive_settings(&ArchiveSettings { archive_days: 7, ..ArchiveSettings::default() })
        .unwrap();
    save(&f.links, "https://a.example", T0, None);
    f.clock.advance_days(8);
    let report = f.scheduler.run_sweep().await.unwrap();
    assert_eq!(report.archived.len(), 1);
}

#[tokio::test]
async fn test_storage_failure_is_reported_not_panicked() {
    let f = setup();
    f.backend.set_failing(true);
    assert!(f.scheduler.refresh_badge().await.is_err());
    assert!(f.scheduler.run_sweep().await.is_err());
}

// ─── Running loop ───

#[tokio::test]
async fn test_start_runs_startup_refresh_and_sweep() {
    let f = setup();
    save(&f.links, "https://stale.example", T0, Some(1));
    f.clock.advance_days(31);
    let badge = f.badge.clone();

    let handle = f.scheduler.start();
    let mut events = handle.events();
    assert_eq!(events.recv().await.unwrap(), SchedulerEvent::Started);
    assert_eq!(
        wait_for(&mut events, |e| matches!(e, SchedulerEvent::BadgeUpdated { .. })).await,
        SchedulerEvent::BadgeUpdated { count: 1 }
    );
    wait_for(&mut events, |e| matches!(e, SchedulerEvent::ArchiveSwept { .. })).await;
    assert_eq!(badge.text(), "1");

    handle.shutdown().await.unwrap();
    assert!(f.links.get_link("https://stale.example").unwrap().unwrap().is_archived);
}

#[tokio::test]
async fn test_link_writes_trigger_badge_refresh() {
    let f = setup();
    let links = f.links.clone();
    let clock = f.clock.clone();

    let handle = f.scheduler.start();
    let mut events = handle.events();
    // Startup sweep emits nothing on an empty store; the startup badge is 0.
    wait_for(&mut events, |e| matches!(e, SchedulerEvent::BadgeUpdated { count: 0 })).await;

    save(&links, "https://due.example", T0 - 10 * DAY_MS, Some(2));
    let event = wait_for(&mut events, |e| matches!(e, SchedulerEvent::BadgeUpdated { count } if *count > 0)).await;
    assert_eq!(event, SchedulerEvent::BadgeUpdated { count: 1 });

    clock.advance_days(1);
    links.mark_opened("https://due.example").unwrap();
    wait_for(&mut events, |e| matches!(e, SchedulerEvent::BadgeUpdated { count: 0 })).await;

    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_tick_emits_task_failed_and_loop_survives() {
    let f = setup();
    f.backend.set_failing(true);
    let backend = f.backend.clone();
    let settings = f.settings.clone();

    let handle = f.scheduler.start();
    let mut events = handle.events();
    let failed = wait_for(&mut events, |e| matches!(e, SchedulerEvent::TaskFailed { .. })).await;
    assert!(matches!(failed, SchedulerEvent::TaskFailed { task: "badge", .. }));

    // Writes to other keys do not trigger a refresh; the loop is still alive to stop.
    backend.set_failing(false);
    settings.mark_onboarding_seen().unwrap();
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_emits_stopped() {
    let f = setup();
    let handle = f.scheduler.start();
    let mut events = handle.events();
    handle.shutdown().await.unwrap();
    wait_for(&mut events, |e| *e == SchedulerEvent::Stopped).await;
}
