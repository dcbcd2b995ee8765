//! "Needs attention" rules and the badge count built on them.

use crate::types::link::{SavedLink, DAY_MS};

/// Whether the link's reminder period has elapsed without it being opened.
/// A reminder of zero days means no reminder.
pub fn needs_attention(link: &SavedLink, now: i64) -> bool {
    let days = match link.reminder_days {
        None | Some(0) => return false,
        Some(days) => days,
    };
    let threshold = now - i64::from(days) * DAY_MS;
    link.last_opened_at.unwrap_or(link.timestamp) < threshold
}

/// Number of links outside the trash that need attention.
pub fn attention_count(links: &[SavedLink], now: i64) -> usize {
    links
        .iter()
        .filter(|link| !link.is_deleted && needs_attention(link, now))
        .count()
}

/// Badge text for `count`; an empty string clears the badge.
pub fn badge_text(count: usize) -> String {
    if count == 0 {
        String::new()
    } else {
        count.to_string()
    }
}
