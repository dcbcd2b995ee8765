// LinkShelf platform abstraction
// Resolves per-OS config and data directories at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `~/.config/linkshelf` (or `$XDG_CONFIG_HOME/linkshelf`)
/// - **macOS**: `~/Library/Application Support/LinkShelf`
/// - **Windows**: `%APPDATA%/LinkShelf`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory, where the database lives.
///
/// - **Linux**: `~/.local/share/linkshelf` (or `$XDG_DATA_HOME/linkshelf`)
/// - **macOS**: `~/Library/Application Support/LinkShelf`
/// - **Windows**: `%APPDATA%/LinkShelf`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
