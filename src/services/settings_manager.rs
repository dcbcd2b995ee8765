// LinkShelf Settings Manager
// Reads and writes user preferences. Each concern (archive, trash, reminder,
// onboarding, reorder mode) lives under its own storage key.

use serde_json::Value;
use tracing::debug;

use crate::storage::{keys, Storage};
use crate::types::errors::SettingsError;
use crate::types::settings::{
    ArchiveSettings, ReminderSettings, ReorderMode, TrashSettings, UserSettings,
};

/// Trait defining the settings manager interface.
pub trait SettingsManagerTrait {
    fn archive_settings(&self) -> Result<ArchiveSettings, SettingsError>;
    fn set_archive_settings(&self, settings: &ArchiveSettings) -> Result<(), SettingsError>;
    fn trash_settings(&self) -> Result<TrashSettings, SettingsError>;
    fn set_trash_settings(&self, settings: &TrashSettings) -> Result<(), SettingsError>;
    fn reminder_settings(&self) -> Result<ReminderSettings, SettingsError>;
    fn set_reminder_settings(&self, settings: &ReminderSettings) -> Result<(), SettingsError>;
    fn get_settings(&self) -> Result<UserSettings, SettingsError>;
    fn set_value(&self, key: &str, value: Value) -> Result<UserSettings, SettingsError>;
    fn reset(&self) -> Result<(), SettingsError>;
    fn has_seen_onboarding(&self) -> Result<bool, SettingsError>;
    fn mark_onboarding_seen(&self) -> Result<(), SettingsError>;
    fn reorder_mode(&self) -> Result<ReorderMode, SettingsError>;
    fn set_reorder_mode(&self, mode: ReorderMode) -> Result<(), SettingsError>;
    fn toggle_reorder_mode(&self) -> Result<ReorderMode, SettingsError>;
}

/// Settings manager over the shared key-value storage.
#[derive(Clone)]
pub struct SettingsManager {
    storage: Storage,
}

impl SettingsManager {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

impl SettingsManagerTrait for SettingsManager {
    fn archive_settings(&self) -> Result<ArchiveSettings, SettingsError> {
        Ok(self.storage.get_or_default(keys::ARCHIVE_SETTINGS)?)
    }

    fn set_archive_settings(&self, settings: &ArchiveSettings) -> Result<(), SettingsError> {
        Ok(self.storage.set(keys::ARCHIVE_SETTINGS, settings)?)
    }

    fn trash_settings(&self) -> Result<TrashSettings, SettingsError> {
        Ok(self.storage.get_or_default(keys::TRASH_SETTINGS)?)
    }

    fn set_trash_settings(&self, settings: &TrashSettings) -> Result<(), SettingsError> {
        Ok(self.storage.set(keys::TRASH_SETTINGS, settings)?)
    }

    fn reminder_settings(&self) -> Result<ReminderSettings, SettingsError> {
        Ok(self.storage.get_or_default(keys::REMINDER_SETTINGS)?)
    }

    fn set_reminder_settings(&self, settings: &ReminderSettings) -> Result<(), SettingsError> {
        Ok(self.storage.set(keys::REMINDER_SETTINGS, settings)?)
    }

    fn get_settings(&self) -> Result<UserSettings, SettingsError> {
        Ok(UserSettings {
            archive: self.archive_settings()?,
            trash: self.trash_settings()?,
            reminder: self.reminder_settings()?,
        })
    }

    /// Updates one setting by dot-notation key path and persists the section
    /// it belongs to.
    ///
    /// # Examples
    /// - `"archive.archiveDays"` → updates `archive.archive_days`
    /// - `"trash.autoDeleteEnabled"` → updates `trash.auto_delete_enabled`
    /// - `"reminder.reminderDays"` → updates `reminder.reminder_days` (`null` clears it)
    fn set_value(&self, key: &str, value: Value) -> Result<UserSettings, SettingsError> {
        let parts: Vec<&str> = key.split('.').collect();
        if key.is_empty() || parts.len() != 2 {
            return Err(SettingsError::InvalidKey(format!(
                "Expected '<section>.<field>', got '{}'",
                key
            )));
        }

        let mut json_value = serde_json::to_value(self.get_settings()?)
            .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;

        let section = json_value
            .get_mut(parts[0])
            .and_then(Value::as_object_mut)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
        if !section.contains_key(parts[1]) {
            return Err(SettingsError::InvalidKey(format!(
                "Key '{}' not found in settings",
                key
            )));
        }
        section.insert(parts[1].to_string(), value);

        // Round-trip through the typed struct to validate the new value
        let updated: UserSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        match parts[0] {
            "archive" => self.set_archive_settings(&updated.archive)?,
            "trash" => self.set_trash_settings(&updated.trash)?,
            _ => self.set_reminder_settings(&updated.reminder)?,
        }
        debug!(key, "setting updated");
        Ok(updated)
    }

    /// Restores archive, trash and reminder settings to their defaults.
    fn reset(&self) -> Result<(), SettingsError> {
        self.set_archive_settings(&ArchiveSettings::default())?;
        self.set_trash_settings(&TrashSettings::default())?;
        self.set_reminder_settings(&ReminderSettings::default())?;
        Ok(())
    }

    fn has_seen_onboarding(&self) -> Result<bool, SettingsError> {
        Ok(self.storage.get_or_default(keys::ONBOARDING_SEEN)?)
    }

    fn mark_onboarding_seen(&self) -> Result<(), SettingsError> {
        Ok(self.storage.set(keys::ONBOARDING_SEEN, &true)?)
    }

    fn reorder_mode(&self) -> Result<ReorderMode, SettingsError> {
        Ok(self.storage.get_or_default(keys::REORDER_STATE)?)
    }

    fn set_reorder_mode(&self, mode: ReorderMode) -> Result<(), SettingsError> {
        Ok(self.storage.set(keys::REORDER_STATE, &mode)?)
    }

    fn toggle_reorder_mode(&self) -> Result<ReorderMode, SettingsError> {
        let next = self.reorder_mode()?.toggled();
        self.set_reorder_mode(next)?;
        Ok(next)
    }
}
