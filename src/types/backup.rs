use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::category::Category;
use super::link::SavedLink;

/// Format version written into exported backups.
pub const BACKUP_VERSION: &str = "1.0.0";

/// Top-level backup document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupFile {
    pub version: String,
    pub timestamp: i64,
    pub data: BackupData,
}

/// Backed-up sections. Settings are kept as raw objects so an empty `{}`
/// can be told apart from a populated section on import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub links: Vec<SavedLink>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub archive_settings: Map<String, Value>,
    #[serde(default)]
    pub trash_settings: Map<String, Value>,
}

/// Which sections an import replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub links: Option<usize>,
    pub categories: Option<usize>,
    pub archive_settings: bool,
    pub trash_settings: bool,
}
