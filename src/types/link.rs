use serde::{Deserialize, Deserializer, Serialize};

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// A saved link with the user's note. The URL is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedLink {
    pub url: String,
    pub title: String,
    pub note: String,
    /// Creation time, epoch millis.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_days: Option<u32>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<i64>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

/// Which lifecycle view a link currently belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    Active,
    Archived,
    Trashed,
}

impl SavedLink {
    /// Creates a fresh, active, unpinned link.
    pub fn new(url: &str, title: &str, note: &str, timestamp: i64) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            note: note.to_string(),
            timestamp,
            categories: Vec::new(),
            is_pinned: false,
            last_opened_at: None,
            position: None,
            reminder_days: None,
            is_archived: false,
            archived_at: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// The moment the link was last touched: opened, or else created.
    pub fn last_activity(&self) -> i64 {
        match self.last_opened_at {
            Some(opened) => opened.max(self.timestamp),
            None => self.timestamp,
        }
    }

    pub fn state(&self) -> LinkState {
        if self.is_deleted {
            LinkState::Trashed
        } else if self.is_archived {
            LinkState::Archived
        } else {
            LinkState::Active
        }
    }

    pub fn has_any_category(&self, ids: &[String]) -> bool {
        !ids.is_empty() && self.categories.iter().any(|c| ids.contains(c))
    }

    /// Merges the set fields of `patch` into this link, then restores the
    /// lifecycle invariant via [`normalize_lifecycle`](Self::normalize_lifecycle).
    pub fn apply(&mut self, patch: &LinkPatch, now: i64) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
        if let Some(categories) = &patch.categories {
            self.categories = categories.clone();
        }
        if let Some(pinned) = patch.is_pinned {
            self.is_pinned = pinned;
        }
        if let Some(opened) = patch.last_opened_at {
            self.last_opened_at = opened;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(days) = patch.reminder_days {
            self.reminder_days = days;
        }
        if let Some(archived) = patch.is_archived {
            self.is_archived = archived;
        }
        if let Some(at) = patch.archived_at {
            self.archived_at = at;
        }
        if let Some(deleted) = patch.is_deleted {
            self.is_deleted = deleted;
        }
        if let Some(at) = patch.deleted_at {
            self.deleted_at = at;
        }
        self.normalize_lifecycle(now);
    }

    /// Keeps the link in exactly one lifecycle state. Trashed links are
    /// neither archived nor pinned, archived links are not pinned. A set
    /// flag without its timestamp is stamped with `now`; a cleared flag
    /// drops its timestamp.
    pub fn normalize_lifecycle(&mut self, now: i64) {
        if self.is_deleted {
            self.is_archived = false;
            self.is_pinned = false;
            self.deleted_at.get_or_insert(now);
        } else {
            self.deleted_at = None;
        }
        if self.is_archived {
            self.is_pinned = false;
            self.archived_at.get_or_insert(now);
        } else {
            self.archived_at = None;
        }
    }
}

/// Partial update for a [`SavedLink`].
///
/// For nullable fields the outer `Option` says whether the field is touched
/// and the inner one carries the new value, so JSON `null` clears a field
/// while a missing key leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub position: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub reminder_days: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Option<i64>>,
}

impl LinkPatch {
    pub fn position(position: i64) -> Self {
        Self {
            position: Some(Some(position)),
            ..Self::default()
        }
    }

    pub fn opened_at(at: i64) -> Self {
        Self {
            last_opened_at: Some(Some(at)),
            ..Self::default()
        }
    }
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// One entry of a batch update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkUpdate {
    pub url: String,
    #[serde(default)]
    pub patch: LinkPatch,
}

/// What to do when a save hits an existing URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the stored record without asking.
    #[default]
    Overwrite,
    /// Leave storage untouched and hand the conflict back to the caller.
    Confirm,
}

/// A save that is waiting for the user to confirm an overwrite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingSave {
    pub existing: SavedLink,
    pub incoming: SavedLink,
}

/// Result of [`save_link`](crate::managers::link_manager::LinkManagerTrait::save_link).
/// Storage failures are reported through the `Err` side instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveOutcome {
    Saved,
    Conflict { pending: PendingSave },
}

/// Home-view quick filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuickFilter {
    Pinned,
    NeedsAttention,
    Recent,
}

/// Filter for the active-links view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub quick_filter: Option<QuickFilter>,
}
