//! Auto-archive eligibility.
//!
//! A link is archived once its last activity (open, or creation if never
//! opened) is older than `archive_days`. Pinned links, links in an excluded
//! category, and links already archived or trashed are never selected.

use crate::types::link::{SavedLink, DAY_MS};

fn is_eligible(link: &SavedLink, excluded_categories: &[String]) -> bool {
    !(link.is_archived
        || link.is_deleted
        || link.is_pinned
        || link.has_any_category(excluded_categories))
}

/// Whether `link` should be archived at `now`.
pub fn should_archive(
    link: &SavedLink,
    archive_days: u32,
    excluded_categories: &[String],
    now: i64,
) -> bool {
    if !is_eligible(link, excluded_categories) {
        return false;
    }
    let threshold = now - i64::from(archive_days) * DAY_MS;
    link.last_activity() < threshold
}

/// Links that will cross the archive threshold within `warn_days`.
///
/// Selects links inactive for more than `archive_days - warn_days` days and
/// at most `archive_days` days, so the result never overlaps with
/// [`should_archive`].
pub fn links_archiving_soon<'a>(
    links: &'a [SavedLink],
    archive_days: u32,
    excluded_categories: &[String],
    warn_days: u32,
    now: i64,
) -> Vec<&'a SavedLink> {
    let soon_threshold = now - i64::from(archive_days.saturating_sub(warn_days)) * DAY_MS;
    let archive_threshold = now - i64::from(archive_days) * DAY_MS;

    links
        .iter()
        .filter(|link| is_eligible(link, excluded_categories))
        .filter(|link| {
            let activity = link.last_activity();
            activity < soon_threshold && activity >= archive_threshold
        })
        .collect()
}
