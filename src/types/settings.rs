use serde::{Deserialize, Serialize};

/// Days of inactivity before a link is archived.
pub const DEFAULT_ARCHIVE_DAYS: u32 = 30;

/// Days a trashed link is kept before it is purged.
pub const DEFAULT_TRASH_RETENTION_DAYS: u32 = 7;

/// Auto-archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSettings {
    #[serde(default = "default_archive_days")]
    pub archive_days: u32,
    #[serde(default)]
    pub excluded_categories: Vec<String>,
    #[serde(default = "default_true")]
    pub auto_archive_enabled: bool,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            archive_days: DEFAULT_ARCHIVE_DAYS,
            excluded_categories: Vec::new(),
            auto_archive_enabled: true,
        }
    }
}

/// Trash retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrashSettings {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_true")]
    pub auto_delete_enabled: bool,
}

impl Default for TrashSettings {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_TRASH_RETENTION_DAYS,
            auto_delete_enabled: true,
        }
    }
}

/// Default reminder period applied to newly saved links.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    #[serde(default)]
    pub reminder_days: Option<u32>,
}

/// Whether the home list is being dragged into a manual order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReorderMode {
    #[default]
    Viewing,
    Reordering,
}

impl ReorderMode {
    pub fn toggled(self) -> Self {
        match self {
            ReorderMode::Viewing => ReorderMode::Reordering,
            ReorderMode::Reordering => ReorderMode::Viewing,
        }
    }
}

/// All user preferences, grouped the way `settings.get` returns them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub trash: TrashSettings,
    #[serde(default)]
    pub reminder: ReminderSettings,
}

fn default_true() -> bool {
    true
}

fn default_archive_days() -> u32 {
    DEFAULT_ARCHIVE_DAYS
}

fn default_retention_days() -> u32 {
    DEFAULT_TRASH_RETENTION_DAYS
}
