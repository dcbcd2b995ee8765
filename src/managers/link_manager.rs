//! Link Manager for LinkShelf.
//!
//! Implements `LinkManagerTrait`: CRUD and lifecycle transitions (pin,
//! archive, trash, restore, delete, reorder) over the saved-link list.
//!
//! The whole list lives under one storage key. Every mutation reads the
//! list, transforms it in memory and writes it back in a single storage
//! write; concurrent writers are last-write-wins.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info};

use crate::services::archive_policy;
use crate::services::clock::{Clock, SystemClock};
use crate::services::reminder_policy::needs_attention;
use crate::services::trash_policy;
use crate::storage::{keys, Storage};
use crate::types::errors::LinkError;
use crate::types::link::{
    DuplicatePolicy, LinkPatch, LinkQuery, LinkUpdate, PendingSave, QuickFilter, SaveOutcome,
    SavedLink, DAY_MS,
};
use crate::types::settings::ReminderSettings;

/// Links opened within this many days match the `recent` quick filter.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Trait defining saved-link operations.
pub trait LinkManagerTrait {
    fn get_all_links(&self) -> Result<Vec<SavedLink>, LinkError>;
    fn get_link(&self, url: &str) -> Result<Option<SavedLink>, LinkError>;
    fn save_link(&self, link: SavedLink, on_duplicate: DuplicatePolicy) -> Result<SaveOutcome, LinkError>;
    fn resolve_conflict(&self, pending: PendingSave, overwrite: bool) -> Result<bool, LinkError>;
    fn delete_link(&self, url: &str) -> Result<(), LinkError>;
    fn update_link(&self, url: &str, patch: &LinkPatch) -> Result<SavedLink, LinkError>;
    fn batch_update(&self, updates: &[LinkUpdate]) -> Result<usize, LinkError>;
    fn move_to_trash(&self, url: &str) -> Result<(), LinkError>;
    fn restore_from_trash(&self, url: &str) -> Result<bool, LinkError>;
    fn move_to_archive(&self, url: &str) -> Result<(), LinkError>;
    fn restore_from_archive(&self, url: &str) -> Result<bool, LinkError>;
    fn batch_archive(&self, urls: &[String]) -> Result<usize, LinkError>;
    fn empty_trash(&self) -> Result<usize, LinkError>;
    fn set_pinned(&self, url: &str, pinned: bool) -> Result<(), LinkError>;
    fn toggle_pin(&self, url: &str) -> Result<bool, LinkError>;
    fn mark_opened(&self, url: &str) -> Result<(), LinkError>;
    fn reorder(&self, urls: &[String]) -> Result<usize, LinkError>;
    fn active_links(&self) -> Result<Vec<SavedLink>, LinkError>;
    fn archived_links(&self) -> Result<Vec<SavedLink>, LinkError>;
    fn trashed_links(&self) -> Result<Vec<SavedLink>, LinkError>;
    fn query_active(&self, query: &LinkQuery) -> Result<Vec<SavedLink>, LinkError>;
}

/// Link manager backed by the shared key-value storage.
#[derive(Clone)]
pub struct LinkManager {
    storage: Storage,
    clock: Arc<dyn Clock>,
}

impl LinkManager {
    /// Creates a `LinkManager` stamping times from the system clock.
    pub fn new(storage: Storage) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    fn load(&self) -> Result<Vec<SavedLink>, LinkError> {
        Ok(self.storage.get_or_default(keys::LINKS)?)
    }

    fn persist(&self, links: &[SavedLink]) -> Result<(), LinkError> {
        Ok(self.storage.set(keys::LINKS, links)?)
    }

    /// Runs `f` on the link stored under `url`. `f` returns its result and
    /// whether the link changed; unchanged links skip the write.
    fn mutate<R>(
        &self,
        url: &str,
        f: impl FnOnce(&mut SavedLink, i64) -> Result<(R, bool), LinkError>,
    ) -> Result<R, LinkError> {
        let mut links = self.load()?;
        let now = self.now();
        let link = links
            .iter_mut()
            .find(|l| l.url == url)
            .ok_or_else(|| LinkError::NotFound(url.to_string()))?;
        let (result, changed) = f(link, now)?;
        if changed {
            self.persist(&links)?;
        }
        Ok(result)
    }

    /// Archives every link the archive policy selects, stamping one shared
    /// time. Returns the archived URLs.
    pub fn archive_inactive(
        &self,
        archive_days: u32,
        excluded_categories: &[String],
    ) -> Result<Vec<String>, LinkError> {
        let mut links = self.load()?;
        let now = self.now();
        let mut archived = Vec::new();
        for link in links.iter_mut() {
            if archive_policy::should_archive(link, archive_days, excluded_categories, now) {
                link.is_archived = true;
                link.archived_at = Some(now);
                link.normalize_lifecycle(now);
                archived.push(link.url.clone());
            }
        }
        if !archived.is_empty() {
            self.persist(&links)?;
            info!(count = archived.len(), archive_days, "auto-archived inactive links");
        }
        Ok(archived)
    }

    /// Active links that the archive policy will pick up within `warn_days`.
    pub fn archiving_soon(
        &self,
        archive_days: u32,
        excluded_categories: &[String],
        warn_days: u32,
    ) -> Result<Vec<SavedLink>, LinkError> {
        let links = self.load()?;
        let now = self.now();
        Ok(archive_policy::links_archiving_soon(&links, archive_days, excluded_categories, warn_days, now)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Permanently removes links that have been in the trash longer than
    /// `retention_days`. Returns how many were removed.
    pub fn purge_expired_trash(&self, retention_days: u32) -> Result<usize, LinkError> {
        let links = self.load()?;
        let (kept, removed) = trash_policy::purge_expired_trash(links, retention_days, self.now());
        if removed > 0 {
            self.persist(&kept)?;
            info!(removed, retention_days, "purged expired trash");
        }
        Ok(removed)
    }

    /// Number of links outside the trash whose reminder is due.
    pub fn attention_count(&self) -> Result<usize, LinkError> {
        let links = self.load()?;
        Ok(crate::services::reminder_policy::attention_count(&links, self.now()))
    }

    fn default_reminder_days(&self) -> Result<Option<u32>, LinkError> {
        let settings: ReminderSettings = self.storage.get_or_default(keys::REMINDER_SETTINGS)?;
        Ok(settings.reminder_days)
    }

    fn write_record(&self, mut incoming: SavedLink) -> Result<(), LinkError> {
        incoming.normalize_lifecycle(self.now());
        let mut links = self.load()?;
        match links.iter_mut().find(|l| l.url == incoming.url) {
            Some(slot) => {
                debug!(url = %incoming.url, "replacing existing link");
                *slot = incoming;
            }
            None => {
                debug!(url = %incoming.url, "adding new link");
                links.push(incoming);
            }
        }
        self.persist(&links)
    }
}

/// Display order: pinned first, then manually positioned links by position,
/// then everything else newest first.
pub fn sort_for_display(links: &mut [SavedLink]) {
    links.sort_by(|a, b| {
        b.is_pinned.cmp(&a.is_pinned).then_with(|| match (a.position, b.position) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.timestamp.cmp(&a.timestamp),
        })
    });
}

fn matches_query(link: &SavedLink, query: &LinkQuery, now: i64) -> bool {
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        let hit = link.title.to_lowercase().contains(&needle)
            || link.note.to_lowercase().contains(&needle)
            || link.url.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }

    if !query.categories.is_empty() && !link.has_any_category(&query.categories) {
        return false;
    }

    match query.quick_filter {
        None => true,
        Some(QuickFilter::Pinned) => link.is_pinned,
        Some(QuickFilter::NeedsAttention) => needs_attention(link, now),
        Some(QuickFilter::Recent) => link
            .last_opened_at
            .is_some_and(|opened| opened >= now - RECENT_WINDOW_DAYS * DAY_MS),
    }
}

impl LinkManagerTrait for LinkManager {
    fn get_all_links(&self) -> Result<Vec<SavedLink>, LinkError> {
        self.load()
    }

    fn get_link(&self, url: &str) -> Result<Option<SavedLink>, LinkError> {
        Ok(self.load()?.into_iter().find(|l| l.url == url))
    }

    /// Saves `link` keyed by its URL.
    ///
    /// An existing record under the same URL is fully replaced when
    /// `on_duplicate` is `Overwrite`. With `Confirm` nothing is written and
    /// the conflict is returned for [`resolve_conflict`](Self::resolve_conflict).
    fn save_link(&self, mut link: SavedLink, on_duplicate: DuplicatePolicy) -> Result<SaveOutcome, LinkError> {
        if link.reminder_days.is_none() {
            link.reminder_days = self.default_reminder_days()?;
        }
        link.normalize_lifecycle(self.now());

        if on_duplicate == DuplicatePolicy::Confirm {
            if let Some(existing) = self.get_link(&link.url)? {
                debug!(url = %link.url, "duplicate save awaiting confirmation");
                return Ok(SaveOutcome::Conflict {
                    pending: PendingSave {
                        existing,
                        incoming: link,
                    },
                });
            }
        }

        let url = link.url.clone();
        self.write_record(link)?;
        info!(url = %url, "link saved");
        Ok(SaveOutcome::Saved)
    }

    /// Commits (`overwrite = true`) or drops a pending duplicate save.
    fn resolve_conflict(&self, pending: PendingSave, overwrite: bool) -> Result<bool, LinkError> {
        if !overwrite {
            debug!(url = %pending.incoming.url, "duplicate save cancelled");
            return Ok(false);
        }
        let url = pending.incoming.url.clone();
        self.write_record(pending.incoming)?;
        info!(url = %url, "link overwritten after confirmation");
        Ok(true)
    }

    /// Permanently removes a link.
    fn delete_link(&self, url: &str) -> Result<(), LinkError> {
        let mut links = self.load()?;
        let before = links.len();
        links.retain(|l| l.url != url);
        if links.len() == before {
            return Err(LinkError::NotFound(url.to_string()));
        }
        self.persist(&links)?;
        info!(url, "link deleted");
        Ok(())
    }

    fn update_link(&self, url: &str, patch: &LinkPatch) -> Result<SavedLink, LinkError> {
        self.mutate(url, |link, now| {
            link.apply(patch, now);
            Ok((link.clone(), true))
        })
    }

    /// Applies updates in order over one in-memory list and writes once.
    /// Unknown URLs are skipped. Returns the number of updates applied.
    fn batch_update(&self, updates: &[LinkUpdate]) -> Result<usize, LinkError> {
        let mut links = self.load()?;
        let now = self.now();
        let mut applied = 0;
        for update in updates {
            match links.iter_mut().find(|l| l.url == update.url) {
                Some(link) => {
                    link.apply(&update.patch, now);
                    applied += 1;
                }
                None => debug!(url = %update.url, "batch update skipped unknown link"),
            }
        }
        if applied > 0 {
            self.persist(&links)?;
        }
        Ok(applied)
    }

    /// Moves a link to the trash, clearing its pin and archive state.
    fn move_to_trash(&self, url: &str) -> Result<(), LinkError> {
        self.mutate(url, |link, now| {
            link.is_deleted = true;
            link.deleted_at = Some(now);
            link.is_pinned = false;
            link.is_archived = false;
            link.archived_at = None;
            Ok(((), true))
        })?;
        info!(url, "link moved to trash");
        Ok(())
    }

    /// Takes a link out of the trash. The link comes back active even if it
    /// was archived before being trashed. Returns `false` if it was not in
    /// the trash.
    fn restore_from_trash(&self, url: &str) -> Result<bool, LinkError> {
        self.mutate(url, |link, _| {
            if !link.is_deleted {
                return Ok((false, false));
            }
            link.is_deleted = false;
            link.deleted_at = None;
            Ok((true, true))
        })
    }

    fn move_to_archive(&self, url: &str) -> Result<(), LinkError> {
        self.mutate(url, |link, now| {
            if link.is_deleted {
                return Err(LinkError::InvalidTransition(format!(
                    "cannot archive trashed link {}",
                    link.url
                )));
            }
            link.is_archived = true;
            link.archived_at = Some(now);
            link.normalize_lifecycle(now);
            Ok(((), true))
        })
    }

    /// Brings an archived link back to the active list and counts the
    /// restore as an open. Returns `false` if it was not archived.
    fn restore_from_archive(&self, url: &str) -> Result<bool, LinkError> {
        self.mutate(url, |link, now| {
            if !link.is_archived {
                return Ok((false, false));
            }
            link.is_archived = false;
            link.archived_at = None;
            link.last_opened_at = Some(now);
            Ok((true, true))
        })
    }

    /// Archives several links with one timestamp in one write. Trashed and
    /// unknown URLs are skipped.
    fn batch_archive(&self, urls: &[String]) -> Result<usize, LinkError> {
        let mut links = self.load()?;
        let now = self.now();
        let mut archived = 0;
        for link in links.iter_mut().filter(|l| urls.contains(&l.url)) {
            if link.is_deleted {
                continue;
            }
            link.is_archived = true;
            link.archived_at = Some(now);
            link.normalize_lifecycle(now);
            archived += 1;
        }
        if archived > 0 {
            self.persist(&links)?;
        }
        Ok(archived)
    }

    /// Permanently removes every trashed link.
    fn empty_trash(&self) -> Result<usize, LinkError> {
        let mut links = self.load()?;
        let before = links.len();
        links.retain(|l| !l.is_deleted);
        let removed = before - links.len();
        if removed > 0 {
            self.persist(&links)?;
            info!(removed, "trash emptied");
        }
        Ok(removed)
    }

    fn set_pinned(&self, url: &str, pinned: bool) -> Result<(), LinkError> {
        self.mutate(url, |link, _| {
            if pinned && (link.is_deleted || link.is_archived) {
                return Err(LinkError::InvalidTransition(format!(
                    "only active links can be pinned: {}",
                    link.url
                )));
            }
            let changed = link.is_pinned != pinned;
            link.is_pinned = pinned;
            Ok(((), changed))
        })
    }

    /// Flips the pin and returns the new state.
    fn toggle_pin(&self, url: &str) -> Result<bool, LinkError> {
        let pinned = !self
            .get_link(url)?
            .ok_or_else(|| LinkError::NotFound(url.to_string()))?
            .is_pinned;
        self.set_pinned(url, pinned)?;
        Ok(pinned)
    }

    fn mark_opened(&self, url: &str) -> Result<(), LinkError> {
        self.mutate(url, |link, now| {
            link.last_opened_at = Some(now);
            Ok(((), true))
        })
    }

    /// Stores the given order as explicit positions (`0..n`).
    fn reorder(&self, urls: &[String]) -> Result<usize, LinkError> {
        let updates: Vec<LinkUpdate> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| LinkUpdate {
                url: url.clone(),
                patch: LinkPatch::position(index as i64),
            })
            .collect();
        self.batch_update(&updates)
    }

    /// Active links in display order.
    fn active_links(&self) -> Result<Vec<SavedLink>, LinkError> {
        let mut links: Vec<SavedLink> = self
            .load()?
            .into_iter()
            .filter(|l| !l.is_deleted && !l.is_archived)
            .collect();
        sort_for_display(&mut links);
        Ok(links)
    }

    /// Archived links, most recently archived first.
    fn archived_links(&self) -> Result<Vec<SavedLink>, LinkError> {
        let mut links: Vec<SavedLink> = self
            .load()?
            .into_iter()
            .filter(|l| !l.is_deleted && l.is_archived)
            .collect();
        links.sort_by(|a, b| b.archived_at.unwrap_or(0).cmp(&a.archived_at.unwrap_or(0)));
        Ok(links)
    }

    /// Trashed links, most recently trashed first.
    fn trashed_links(&self) -> Result<Vec<SavedLink>, LinkError> {
        let mut links: Vec<SavedLink> = self.load()?.into_iter().filter(|l| l.is_deleted).collect();
        links.sort_by(|a, b| b.deleted_at.unwrap_or(0).cmp(&a.deleted_at.unwrap_or(0)));
        Ok(links)
    }

    /// Active links matching `query`, in display order.
    fn query_active(&self, query: &LinkQuery) -> Result<Vec<SavedLink>, LinkError> {
        let now = self.now();
        Ok(self
            .active_links()?
            .into_iter()
            .filter(|l| matches_query(l, query, now))
            .collect())
    }
}
