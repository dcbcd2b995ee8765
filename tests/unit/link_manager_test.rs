//! Unit tests for the Link Manager: saving, lifecycle transitions, batch
//! operations, ordering and the active-view query.

use std::sync::Arc;

use linkshelf::managers::link_manager::{sort_for_display, LinkManager, LinkManagerTrait};
use linkshelf::services::clock::ManualClock;
use linkshelf::storage::{keys, MemoryBackend, Storage};
use linkshelf::types::errors::LinkError;
use linkshelf::types::link::{
    DuplicatePolicy, LinkPatch, LinkQuery, LinkState, LinkUpdate, PendingSave, QuickFilter,
    SaveOutcome, SavedLink, DAY_MS,
};
use linkshelf::types::settings::ReminderSettings;

const T0: i64 = 1_700_000_000_000;

fn setup() -> (LinkManager, ManualClock, Storage) {
    let storage = Storage::in_memory();
    let clock = ManualClock::new(T0);
    let manager = LinkManager::with_clock(storage.clone(), Arc::new(clock.clone()));
    (manager, clock, storage)
}

fn link(url: &str, timestamp: i64) -> SavedLink {
    SavedLink::new(url, &format!("Title {}", url), "", timestamp)
}

fn save(manager: &LinkManager, link: SavedLink) {
    let outcome = manager.save_link(link, DuplicatePolicy::Overwrite).unwrap();
    assert_eq!(outcome, SaveOutcome::Saved);
}

// ─── Saving ───

#[test]
fn test_save_and_get() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    let stored = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(stored.title, "Title https://a.example");
    assert_eq!(stored.state(), LinkState::Active);
}

#[test]
fn test_duplicate_save_without_confirm_replaces_whole_record() {
    let (manager, _, _) = setup();
    let mut first = link("https://a.example", T0);
    first.note = "first".to_string();
    first.is_pinned = true;
    first.categories = vec!["c1".to_string()];
    save(&manager, first);

    let mut second = link("https://a.example", T0 + 5_000);
    second.note = "second".to_string();
    save(&manager, second);

    let all = manager.get_all_links().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].note, "second");
    assert_eq!(all[0].timestamp, T0 + 5_000);
    assert!(!all[0].is_pinned);
    assert!(all[0].categories.is_empty());
}

#[test]
fn test_duplicate_save_with_confirm_returns_conflict_and_writes_nothing() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));

    let mut incoming = link("https://a.example", T0 + 1);
    incoming.note = "new".to_string();
    let outcome = manager.save_link(incoming, DuplicatePolicy::Confirm).unwrap();
    let SaveOutcome::Conflict { pending } = outcome else {
        panic!("expected a conflict");
    };
    assert_eq!(pending.existing.timestamp, T0);
    assert_eq!(pending.incoming.note, "new");
    assert_eq!(manager.get_link("https://a.example").unwrap().unwrap().note, "");

    assert!(manager.resolve_conflict(pending, true).unwrap());
    assert_eq!(manager.get_link("https://a.example").unwrap().unwrap().note, "new");
}

#[test]
fn test_cancelled_conflict_keeps_existing() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    let outcome = manager
        .save_link(link("https://a.example", T0 + 1), DuplicatePolicy::Confirm)
        .unwrap();
    let SaveOutcome::Conflict { pending } = outcome else {
        panic!("expected a conflict");
    };
    assert!(!manager.resolve_conflict(pending, false).unwrap());
    assert_eq!(manager.get_link("https://a.example").unwrap().unwrap().timestamp, T0);
}

#[test]
fn test_resolved_conflict_is_normalized_before_write() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));

    let mut incoming = link("https://a.example", T0 + 1);
    incoming.is_deleted = true;
    incoming.is_archived = true;
    incoming.archived_at = Some(T0);
    incoming.is_pinned = true;
    let existing = manager.get_link("https://a.example").unwrap().unwrap();
    assert!(manager.resolve_conflict(PendingSave { existing, incoming }, true).unwrap());

    let stored = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(stored.state(), LinkState::Trashed);
    assert!(!stored.is_archived);
    assert!(!stored.is_pinned);
    assert_eq!(stored.archived_at, None);
    assert_eq!(stored.deleted_at, Some(T0));
}

#[test]
fn test_confirm_on_new_url_saves_directly() {
    let (manager, _, _) = setup();
    let outcome = manager
        .save_link(link("https://new.example", T0), DuplicatePolicy::Confirm)
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Saved);
}

#[test]
fn test_save_applies_default_reminder_days() {
    let (manager, _, storage) = setup();
    storage
        .set(keys::REMINDER_SETTINGS, &ReminderSettings { reminder_days: Some(5) })
        .unwrap();

    save(&manager, link("https://a.example", T0));
    let mut explicit = link("https://b.example", T0);
    explicit.reminder_days = Some(2);
    save(&manager, explicit);

    assert_eq!(manager.get_link("https://a.example").unwrap().unwrap().reminder_days, Some(5));
    assert_eq!(manager.get_link("https://b.example").unwrap().unwrap().reminder_days, Some(2));
}

#[test]
fn test_zero_day_default_reminder_never_needs_attention() {
    let (manager, clock, storage) = setup();
    storage
        .set(keys::REMINDER_SETTINGS, &ReminderSettings { reminder_days: Some(0) })
        .unwrap();
    save(&manager, link("https://a.example", T0));

    clock.set(T0 + 1);
    assert_eq!(manager.attention_count().unwrap(), 0);
    clock.advance_days(365);
    assert_eq!(manager.attention_count().unwrap(), 0);
}

#[test]
fn test_save_normalizes_conflicting_flags() {
    let (manager, _, _) = setup();
    let mut odd = link("https://a.example", T0);
    odd.is_deleted = true;
    odd.deleted_at = Some(T0);
    odd.is_archived = true;
    odd.is_pinned = true;
    save(&manager, odd);

    let stored = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(stored.state(), LinkState::Trashed);
    assert!(!stored.is_archived);
    assert!(!stored.is_pinned);
}

// ─── Delete / update ───

#[test]
fn test_delete_link_removes_permanently() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    manager.delete_link("https://a.example").unwrap();
    assert!(manager.get_all_links().unwrap().is_empty());
}

#[test]
fn test_delete_unknown_link_is_not_found() {
    let (manager, _, _) = setup();
    let err = manager.delete_link("https://missing.example").unwrap_err();
    assert!(matches!(err, LinkError::NotFound(_)));
}

#[test]
fn test_update_link_merges_patch() {
    let (manager, _, _) = setup();
    let mut original = link("https://a.example", T0);
    original.note = "keep".to_string();
    original.position = Some(3);
    save(&manager, original);

    let patch: LinkPatch = serde_json::from_str(r#"{"title": "Renamed", "position": null}"#).unwrap();
    let updated = manager.update_link("https://a.example", &patch).unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.note, "keep");
    assert_eq!(updated.position, None);
}

#[test]
fn test_update_trashing_link_stamps_deleted_at_for_purge() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://a.example", T0));

    let patch: LinkPatch = serde_json::from_str(r#"{"isDeleted": true}"#).unwrap();
    let updated = manager.update_link("https://a.example", &patch).unwrap();
    assert_eq!(updated.deleted_at, Some(T0));

    clock.advance_days(8);
    assert_eq!(manager.purge_expired_trash(7).unwrap(), 1);
    assert!(manager.get_link("https://a.example").unwrap().is_none());
}

#[test]
fn test_update_archiving_link_stamps_archived_at() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    let patch = LinkPatch { is_archived: Some(true), ..LinkPatch::default() };
    let updated = manager.update_link("https://a.example", &patch).unwrap();
    assert_eq!(updated.archived_at, Some(T0));
}

#[test]
fn test_update_unknown_link_is_not_found() {
    let (manager, _, _) = setup();
    let err = manager
        .update_link("https://missing.example", &LinkPatch::default())
        .unwrap_err();
    assert!(matches!(err, LinkError::NotFound(_)));
}

#[test]
fn test_batch_update_last_update_for_same_url_wins() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));

    let updates = vec![
        LinkUpdate {
            url: "https://a.example".to_string(),
            patch: LinkPatch { note: Some("first".to_string()), ..LinkPatch::default() },
        },
        LinkUpdate {
            url: "https://a.example".to_string(),
            patch: LinkPatch { note: Some("second".to_string()), ..LinkPatch::default() },
        },
        LinkUpdate {
            url: "https://missing.example".to_string(),
            patch: LinkPatch::default(),
        },
    ];
    assert_eq!(manager.batch_update(&updates).unwrap(), 2);
    assert_eq!(manager.get_link("https://a.example").unwrap().unwrap().note, "second");
}

#[test]
fn test_batch_update_writes_once() {
    let (manager, _, storage) = setup();
    save(&manager, link("https://a.example", T0));
    save(&manager, link("https://b.example", T0));
    let mut changes = storage.subscribe();

    manager.reorder(&["https://b.example".to_string(), "https://a.example".to_string()]).unwrap();
    assert_eq!(changes.try_recv().unwrap().key, keys::LINKS);
    assert!(changes.try_recv().is_err());
}

// ─── Trash ───

#[test]
fn test_move_to_trash_clears_pin_and_archive() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://a.example", T0));
    manager.set_pinned("https://a.example", true).unwrap();

    clock.advance_days(1);
    manager.move_to_trash("https://a.example").unwrap();
    let trashed = manager.get_link("https://a.example").unwrap().unwrap();
    assert!(trashed.is_deleted);
    assert_eq!(trashed.deleted_at, Some(T0 + DAY_MS));
    assert!(!trashed.is_pinned);
    assert!(!trashed.is_archived);
    assert!(trashed.archived_at.is_none());
}

#[test]
fn test_trash_archived_link_then_restore_comes_back_active() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    manager.move_to_archive("https://a.example").unwrap();
    manager.move_to_trash("https://a.example").unwrap();

    assert!(manager.restore_from_trash("https://a.example").unwrap());
    let restored = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(restored.state(), LinkState::Active);
    assert!(restored.deleted_at.is_none());
}

#[test]
fn test_second_restore_from_trash_is_noop() {
    let (manager, _, storage) = setup();
    save(&manager, link("https://a.example", T0));
    manager.move_to_trash("https://a.example").unwrap();
    assert!(manager.restore_from_trash("https://a.example").unwrap());

    let mut changes = storage.subscribe();
    assert!(!manager.restore_from_trash("https://a.example").unwrap());
    assert!(changes.try_recv().is_err(), "no-op restore must not write");
}

#[test]
fn test_empty_trash_removes_only_trashed() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    save(&manager, link("https://b.example", T0));
    save(&manager, link("https://c.example", T0));
    manager.move_to_trash("https://a.example").unwrap();
    manager.move_to_trash("https://c.example").unwrap();

    assert_eq!(manager.empty_trash().unwrap(), 2);
    let remaining: Vec<String> = manager.get_all_links().unwrap().into_iter().map(|l| l.url).collect();
    assert_eq!(remaining, vec!["https://b.example".to_string()]);
    assert_eq!(manager.empty_trash().unwrap(), 0);
}

#[test]
fn test_purge_expired_trash_respects_retention() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://old.example", T0));
    save(&manager, link("https://new.example", T0));
    manager.move_to_trash("https://old.example").unwrap();
    clock.advance_days(5);
    manager.move_to_trash("https://new.example").unwrap();
    clock.advance_days(3);

    assert_eq!(manager.purge_expired_trash(7).unwrap(), 1);
    let remaining = manager.trashed_links().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].url, "https://new.example");
}

// ─── Archive ───

#[test]
fn test_archive_unpins_and_restore_counts_as_open() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://a.example", T0));
    manager.set_pinned("https://a.example", true).unwrap();
    manager.move_to_archive("https://a.example").unwrap();

    let archived = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(archived.state(), LinkState::Archived);
    assert_eq!(archived.archived_at, Some(T0));
    assert!(!archived.is_pinned);

    clock.advance_days(2);
    assert!(manager.restore_from_archive("https://a.example").unwrap());
    let restored = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(restored.state(), LinkState::Active);
    assert_eq!(restored.last_opened_at, Some(T0 + 2 * DAY_MS));
    assert!(!manager.restore_from_archive("https://a.example").unwrap());
}

#[test]
fn test_archiving_trashed_link_is_invalid() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    manager.move_to_trash("https://a.example").unwrap();
    let err = manager.move_to_archive("https://a.example").unwrap_err();
    assert!(matches!(err, LinkError::InvalidTransition(_)));
}

#[test]
fn test_batch_archive_skips_trashed_and_unknown() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    save(&manager, link("https://b.example", T0));
    manager.move_to_trash("https://b.example").unwrap();

    let urls = vec![
        "https://a.example".to_string(),
        "https://b.example".to_string(),
        "https://missing.example".to_string(),
    ];
    assert_eq!(manager.batch_archive(&urls).unwrap(), 1);
    assert_eq!(manager.archived_links().unwrap().len(), 1);
    assert_eq!(manager.trashed_links().unwrap().len(), 1);
}

#[test]
fn test_sweep_archives_after_thirty_one_days() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://stale.example", T0));
    let mut pinned = link("https://pinned.example", T0);
    pinned.is_pinned = true;
    save(&manager, pinned);

    clock.advance_days(31);
    let archived = manager.archive_inactive(30, &[]).unwrap();
    assert_eq!(archived, vec!["https://stale.example".to_string()]);

    let stale = manager.get_link("https://stale.example").unwrap().unwrap();
    assert!(stale.is_archived);
    assert_eq!(stale.archived_at, Some(T0 + 31 * DAY_MS));
    assert!(!manager.get_link("https://pinned.example").unwrap().unwrap().is_archived);
}

#[test]
fn test_sweep_skips_excluded_categories() {
    let (manager, clock, _) = setup();
    let mut keep = link("https://keep.example", T0);
    keep.categories = vec!["reference".to_string()];
    save(&manager, keep);

    clock.advance_days(40);
    assert!(manager.archive_inactive(30, &["reference".to_string()]).unwrap().is_empty());
}

#[test]
fn test_archived_links_sorted_most_recent_first() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://a.example", T0));
    save(&manager, link("https://b.example", T0));
    manager.move_to_archive("https://a.example").unwrap();
    clock.advance_days(1);
    manager.move_to_archive("https://b.example").unwrap();

    let urls: Vec<String> = manager.archived_links().unwrap().into_iter().map(|l| l.url).collect();
    assert_eq!(urls, vec!["https://b.example".to_string(), "https://a.example".to_string()]);
}

// ─── Pin / open / reorder ───

#[test]
fn test_toggle_pin_flips_state() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    assert!(manager.toggle_pin("https://a.example").unwrap());
    assert!(!manager.toggle_pin("https://a.example").unwrap());
}

#[test]
fn test_pinning_archived_link_is_refused() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    manager.move_to_archive("https://a.example").unwrap();
    let err = manager.set_pinned("https://a.example", true).unwrap_err();
    assert!(matches!(err, LinkError::InvalidTransition(_)));
}

#[test]
fn test_mark_opened_stamps_now() {
    let (manager, clock, _) = setup();
    save(&manager, link("https://a.example", T0));
    clock.advance_days(3);
    manager.mark_opened("https://a.example").unwrap();
    let opened = manager.get_link("https://a.example").unwrap().unwrap();
    assert_eq!(opened.last_opened_at, Some(T0 + 3 * DAY_MS));
}

#[test]
fn test_reorder_sets_positions_and_display_order() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    save(&manager, link("https://b.example", T0 + 1));
    save(&manager, link("https://c.example", T0 + 2));

    let order = vec![
        "https://b.example".to_string(),
        "https://c.example".to_string(),
        "https://a.example".to_string(),
    ];
    assert_eq!(manager.reorder(&order).unwrap(), 3);
    let urls: Vec<String> = manager.active_links().unwrap().into_iter().map(|l| l.url).collect();
    assert_eq!(urls, order);
}

#[test]
fn test_sort_for_display_pinned_then_position_then_newest() {
    let mut pinned = link("https://pinned.example", T0);
    pinned.is_pinned = true;
    let mut positioned = link("https://positioned.example", T0);
    positioned.position = Some(0);
    let older = link("https://older.example", T0 + 1);
    let newer = link("https://newer.example", T0 + 2);

    let mut links = vec![older, newer, positioned, pinned];
    sort_for_display(&mut links);
    let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://pinned.example",
            "https://positioned.example",
            "https://newer.example",
            "https://older.example",
        ]
    );
}

// ─── Query ───

#[test]
fn test_query_search_matches_title_note_and_url() {
    let (manager, _, _) = setup();
    let mut a = link("https://rust-lang.org", T0);
    a.title = "The Book".to_string();
    let mut b = link("https://b.example", T0);
    b.note = "read about Rust traits".to_string();
    save(&manager, a);
    save(&manager, b);
    save(&manager, link("https://c.example", T0));

    let query = LinkQuery { search: Some("  RUST ".to_string()), ..LinkQuery::default() };
    assert_eq!(manager.query_active(&query).unwrap().len(), 2);
}

#[test]
fn test_query_filters_categories_and_quick_filters() {
    let (manager, clock, _) = setup();
    let mut work = link("https://work.example", T0);
    work.categories = vec!["work".to_string()];
    work.reminder_days = Some(1);
    save(&manager, work);
    save(&manager, link("https://play.example", T0));
    manager.set_pinned("https://play.example", true).unwrap();

    clock.advance_days(2);
    let by_category = LinkQuery { categories: vec!["work".to_string()], ..LinkQuery::default() };
    assert_eq!(manager.query_active(&by_category).unwrap()[0].url, "https://work.example");

    let pinned = LinkQuery { quick_filter: Some(QuickFilter::Pinned), ..LinkQuery::default() };
    assert_eq!(manager.query_active(&pinned).unwrap()[0].url, "https://play.example");

    let attention = LinkQuery { quick_filter: Some(QuickFilter::NeedsAttention), ..LinkQuery::default() };
    let due = manager.query_active(&attention).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].url, "https://work.example");

    manager.mark_opened("https://play.example").unwrap();
    let recent = LinkQuery { quick_filter: Some(QuickFilter::Recent), ..LinkQuery::default() };
    assert_eq!(manager.query_active(&recent).unwrap()[0].url, "https://play.example");
}

#[test]
fn test_query_excludes_archived_and_trashed() {
    let (manager, _, _) = setup();
    save(&manager, link("https://a.example", T0));
    save(&manager, link("https://b.example", T0));
    save(&manager, link("https://c.example", T0));
    manager.move_to_archive("https://b.example").unwrap();
    manager.move_to_trash("https://c.example").unwrap();

    let all = manager.query_active(&LinkQuery::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].url, "https://a.example");
}

// ─── Storage failures ───

#[test]
fn test_storage_failure_surfaces_as_link_error() {
    let backend = Arc::new(MemoryBackend::new());
    let manager = LinkManager::new(Storage::from_arc(backend.clone()));
    backend.set_failing(true);

    let err = manager.get_all_links().unwrap_err();
    assert!(matches!(err, LinkError::Storage(_)));
    assert!(manager.move_to_trash("https://a.example").is_err());
}
