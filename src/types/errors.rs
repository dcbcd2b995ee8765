use std::fmt;

// === StorageError ===

/// Errors raised by the key-value storage layer.
#[derive(Debug)]
pub enum StorageError {
    /// The backing database failed.
    DatabaseError(String),
    /// A stored value could not be encoded or decoded.
    SerializationError(String),
    /// The storage lock was poisoned by a panicking writer.
    Poisoned,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
            StorageError::Poisoned => write!(f, "Storage lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::SerializationError(e.to_string())
    }
}

// === LinkError ===

/// Errors related to saved-link operations.
#[derive(Debug)]
pub enum LinkError {
    /// No link is saved under the given URL.
    NotFound(String),
    /// The requested lifecycle transition is not allowed from the link's state.
    InvalidTransition(String),
    /// Reading or writing the link list failed.
    Storage(StorageError),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NotFound(url) => write!(f, "Link not found: {}", url),
            LinkError::InvalidTransition(msg) => write!(f, "Invalid link transition: {}", msg),
            LinkError::Storage(e) => write!(f, "Link storage error: {}", e),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for LinkError {
    fn from(e: StorageError) -> Self {
        LinkError::Storage(e)
    }
}

// === CategoryError ===

/// Errors related to category management.
#[derive(Debug)]
pub enum CategoryError {
    /// Category with the given ID was not found.
    NotFound(String),
    /// The category name is empty after trimming.
    EmptyName,
    /// Another category already uses this name (case-insensitive).
    DuplicateName(String),
    /// The color is not a `#rgb` / `#rrggbb` hex value.
    InvalidColor(String),
    /// The icon is not one of the preset icons.
    InvalidIcon(String),
    /// Reading or writing the category list failed.
    Storage(StorageError),
}

impl fmt::Display for CategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryError::NotFound(id) => write!(f, "Category not found: {}", id),
            CategoryError::EmptyName => write!(f, "Category name is required"),
            CategoryError::DuplicateName(name) => {
                write!(f, "Category name already exists: {}", name)
            }
            CategoryError::InvalidColor(color) => write!(f, "Invalid category color: {}", color),
            CategoryError::InvalidIcon(icon) => write!(f, "Invalid category icon: {}", icon),
            CategoryError::Storage(e) => write!(f, "Category storage error: {}", e),
        }
    }
}

impl std::error::Error for CategoryError {}

impl From<StorageError> for CategoryError {
    fn from(e: StorageError) -> Self {
        CategoryError::Storage(e)
    }
}

// === SettingsError ===

/// Errors related to user settings.
#[derive(Debug)]
pub enum SettingsError {
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
    /// Reading or writing a settings record failed.
    Storage(StorageError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
            SettingsError::Storage(e) => write!(f, "Settings storage error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<StorageError> for SettingsError {
    fn from(e: StorageError) -> Self {
        SettingsError::Storage(e)
    }
}

// === BackupError ===

/// Errors related to backup export and import.
#[derive(Debug)]
pub enum BackupError {
    /// The file is not valid JSON.
    Parse(String),
    /// `version`, `timestamp` or `data` is missing.
    InvalidFormat,
    /// `data.links` is not an array of links.
    InvalidLinks(String),
    /// A settings section could not be read.
    InvalidSection(String),
    /// Reading or writing storage failed.
    Storage(StorageError),
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::Parse(msg) => write!(f, "Backup parse error: {}", msg),
            BackupError::InvalidFormat => write!(f, "Invalid backup file format"),
            BackupError::InvalidLinks(msg) => write!(f, "Invalid links data: {}", msg),
            BackupError::InvalidSection(msg) => write!(f, "Invalid backup section: {}", msg),
            BackupError::Storage(e) => write!(f, "Backup storage error: {}", e),
        }
    }
}

impl std::error::Error for BackupError {}

impl From<StorageError> for BackupError {
    fn from(e: StorageError) -> Self {
        BackupError::Storage(e)
    }
}

// === UrlValidationError ===

/// Reasons a URL cannot be saved.
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    /// The text is not an absolute URL.
    Malformed(String),
    /// Browser-internal and local schemes are not saveable.
    DisallowedScheme(String),
}

impl fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlValidationError::Malformed(url) => write!(f, "Invalid URL: {}", url),
            UrlValidationError::DisallowedScheme(_) => write!(
                f,
                "URLs that start with about:, chrome:, edge:, or file: cannot be saved."
            ),
        }
    }
}

impl std::error::Error for UrlValidationError {}

// === ConfigError ===

/// Errors related to the host configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading or writing the config file.
    IoError(String),
    /// The config file could not be parsed or written.
    SerializationError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::SerializationError(msg) => {
                write!(f, "Config serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// === SchedulerError ===

/// Errors raised by background scheduler tasks.
#[derive(Debug)]
pub enum SchedulerError {
    Link(LinkError),
    Settings(SettingsError),
    /// A blocking task panicked or was cancelled.
    Task(String),
    /// The scheduler task is no longer running.
    Stopped,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::Link(e) => write!(f, "Scheduler link error: {}", e),
            SchedulerError::Settings(e) => write!(f, "Scheduler settings error: {}", e),
            SchedulerError::Task(msg) => write!(f, "Scheduler task failed: {}", msg),
            SchedulerError::Stopped => write!(f, "Scheduler is not running"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<LinkError> for SchedulerError {
    fn from(e: LinkError) -> Self {
        SchedulerError::Link(e)
    }
}

impl From<SettingsError> for SchedulerError {
    fn from(e: SettingsError) -> Self {
        SchedulerError::Settings(e)
    }
}
