// LinkShelf services
// Lifecycle policies, settings, backup, URL checks, host config and the
// background scheduler.

pub mod archive_policy;
pub mod backup;
pub mod clock;
pub mod host_config;
pub mod reminder_policy;
pub mod scheduler;
pub mod settings_manager;
pub mod trash_policy;
pub mod url_validation;
