// LinkShelf Backup Service
// Exports links, categories and archive/trash settings as one JSON document
// and merges such a document back into storage.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::services::clock::{Clock, SystemClock};
use crate::storage::{keys, Storage};
use crate::types::backup::{BackupData, BackupFile, ImportSummary, BACKUP_VERSION};
use crate::types::errors::BackupError;
use crate::types::link::SavedLink;
use crate::types::settings::{ArchiveSettings, TrashSettings};

/// Trait defining backup operations.
pub trait BackupServiceTrait {
    fn export(&self) -> Result<BackupFile, BackupError>;
    fn export_json(&self) -> Result<String, BackupError>;
    fn import(&self, backup: BackupFile) -> Result<ImportSummary, BackupError>;
    fn import_json(&self, text: &str) -> Result<ImportSummary, BackupError>;
}

pub struct BackupService {
    storage: Storage,
    clock: Arc<dyn Clock>,
}

impl BackupService {
    pub fn new(storage: Storage) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Suggested download name for a backup taken at `timestamp`.
    pub fn file_name(timestamp: i64) -> String {
        format!("linkshelf-backup-{}.json", timestamp)
    }

    /// Parses and validates a backup document.
    ///
    /// A document needs a non-empty `version`, a non-zero `timestamp`, a
    /// `data` object, and `data.links` must be an array of links.
    pub fn parse(text: &str) -> Result<BackupFile, BackupError> {
        let raw: Value = serde_json::from_str(text).map_err(|e| BackupError::Parse(e.to_string()))?;

        let has_version = raw
            .get("version")
            .and_then(Value::as_str)
            .is_some_and(|v| !v.is_empty());
        let has_timestamp = raw
            .get("timestamp")
            .and_then(Value::as_i64)
            .is_some_and(|t| t != 0);
        let data = raw.get("data").filter(|d| d.is_object());
        let Some(data) = data.filter(|_| has_version && has_timestamp) else {
            return Err(BackupError::InvalidFormat);
        };

        let links = data
            .get("links")
            .filter(|l| l.is_array())
            .ok_or_else(|| BackupError::InvalidLinks("expected an array".to_string()))?;
        serde_json::from_value::<Vec<SavedLink>>(links.clone())
            .map_err(|e| BackupError::InvalidLinks(e.to_string()))?;

        serde_json::from_value(raw).map_err(|e| BackupError::InvalidSection(e.to_string()))
    }

    fn stored_object(&self, key: &str) -> Result<Map<String, Value>, BackupError> {
        match self.storage.get::<Value>(key)? {
            Some(Value::Object(map)) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Decodes a settings section, or `None` when the backup left it empty.
fn section<T: DeserializeOwned>(name: &str, map: Map<String, Value>) -> Result<Option<T>, BackupError> {
    if map.is_empty() {
        return Ok(None);
    }
    serde_json::from_value(Value::Object(map))
        .map(Some)
        .map_err(|e| BackupError::InvalidSection(format!("{}: {}", name, e)))
}

impl BackupServiceTrait for BackupService {
    fn export(&self) -> Result<BackupFile, BackupError> {
        Ok(BackupFile {
            version: BACKUP_VERSION.to_string(),
            timestamp: self.clock.now_ms(),
            data: BackupData {
                links: self.storage.get_or_default(keys::LINKS)?,
                categories: self.storage.get_or_default(keys::CATEGORIES)?,
                archive_settings: self.stored_object(keys::ARCHIVE_SETTINGS)?,
                trash_settings: self.stored_object(keys::TRASH_SETTINGS)?,
            },
        })
    }

    fn export_json(&self) -> Result<String, BackupError> {
        let backup = self.export()?;
        serde_json::to_string_pretty(&backup).map_err(|e| BackupError::Parse(e.to_string()))
    }

    /// Replaces each stored section with the backup's section when the
    /// latter is non-empty. Empty sections keep what is already stored.
    fn import(&self, backup: BackupFile) -> Result<ImportSummary, BackupError> {
        let BackupData {
            links,
            categories,
            archive_settings,
            trash_settings,
        } = backup.data;

        // Decode everything before the first write so a bad section leaves storage untouched.
        let archive: Option<ArchiveSettings> = section("archiveSettings", archive_settings)?;
        let trash: Option<TrashSettings> = section("trashSettings", trash_settings)?;

        let mut summary = ImportSummary::default();

        if !links.is_empty() {
            let now = self.clock.now_ms();
            let links: Vec<SavedLink> = links
                .into_iter()
                .map(|mut link| {
                    link.normalize_lifecycle(now);
                    link
                })
                .collect();
            self.storage.set(keys::LINKS, &links)?;
            summary.links = Some(links.len());
        }
        if !categories.is_empty() {
            self.storage.set(keys::CATEGORIES, &categories)?;
            summary.categories = Some(categories.len());
        }
        if let Some(archive) = archive {
            self.storage.set(keys::ARCHIVE_SETTINGS, &archive)?;
            summary.archive_settings = true;
        }
        if let Some(trash) = trash {
            self.storage.set(keys::TRASH_SETTINGS, &trash)?;
            summary.trash_settings = true;
        }

        info!(
            version = %backup.version,
            links = ?summary.links,
            categories = ?summary.categories,
            "backup imported"
        );
        Ok(summary)
    }

    fn import_json(&self, text: &str) -> Result<ImportSummary, BackupError> {
        let backup = Self::parse(text).inspect_err(|e| warn!(error = %e, "rejected backup file"))?;
        self.import(backup)
    }
}
