//! Trash retention.

use crate::types::link::{SavedLink, DAY_MS};

/// Drops trashed links that have been in the trash for `retention_days` or
/// longer. Links without `deleted_at` are always kept.
///
/// Returns the surviving links and the number removed.
pub fn purge_expired_trash(
    links: Vec<SavedLink>,
    retention_days: u32,
    now: i64,
) -> (Vec<SavedLink>, usize) {
    let retention_ms = i64::from(retention_days) * DAY_MS;
    let before = links.len();
    let kept: Vec<SavedLink> = links
        .into_iter()
        .filter(|link| match link.deleted_at {
            None => true,
            Some(deleted_at) => now - deleted_at < retention_ms,
        })
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
