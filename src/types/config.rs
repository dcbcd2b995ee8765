use serde::{Deserialize, Serialize};

/// Configuration of the host process itself (not user preferences).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// Directory holding `linkshelf.db`. `None` means the platform data dir.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default = "default_badge_interval")]
    pub badge_interval_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            badge_interval_secs: default_badge_interval(),
            sweep_interval_secs: default_sweep_interval(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_badge_interval() -> u64 {
    60 * 60
}

fn default_sweep_interval() -> u64 {
    24 * 60 * 60
}

fn default_log_filter() -> String {
    "linkshelf=info".to_string()
}
