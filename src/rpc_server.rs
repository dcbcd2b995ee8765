//! LinkShelf RPC host: JSON-RPC over stdin/stdout for the extension UI.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"link.save", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Events:   {"event":"ready",...} at startup, {"event":"badge","text":"3"}
//!
//! Logs go to stderr; stdout carries only the protocol.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use linkshelf::app::App;
use linkshelf::rpc_handler::handle_method;
use linkshelf::services::host_config::{resolve_data_dir, HostConfigStore, DATABASE_FILE};
use linkshelf::services::scheduler::{BadgeSink, SchedulerConfig};

/// Simple rate limiter: max requests per one-second window.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

/// Serialises protocol lines onto stdout.
#[derive(Clone)]
struct Output {
    stdout: Arc<Mutex<io::Stdout>>,
}

impl Output {
    fn new() -> Self {
        Self { stdout: Arc::new(Mutex::new(io::stdout())) }
    }

    fn send(&self, message: &Value) {
        let Ok(mut out) = self.stdout.lock() else {
            error!("stdout lock poisoned");
            return;
        };
        if let Err(e) = writeln!(out, "{}", message).and_then(|_| out.flush()) {
            error!(error = %e, "failed to write to stdout");
        }
    }
}

/// Pushes badge text to the extension as an event line.
struct StdoutBadge {
    output: Output,
}

impl BadgeSink for StdoutBadge {
    fn set_badge_text(&self, text: &str) {
        self.output.send(&json!({"event": "badge", "text": text}));
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config_store = HostConfigStore::new(None);
    let loaded = config_store.load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    init_tracing(&config.log_filter);
    if let Err(e) = &loaded {
        warn!(
            path = %config_store.get_config_path().display(),
            error = %e,
            "host config unreadable, using defaults"
        );
    }

    let data_dir = resolve_data_dir(&config);
    std::fs::create_dir_all(&data_dir)?;
    let app = Arc::new(App::new(data_dir.join(DATABASE_FILE))?);

    let output = Output::new();
    output.send(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));
    info!(data_dir = %data_dir.display(), "linkshelf host ready");

    let scheduler = app
        .scheduler(
            Arc::new(StdoutBadge { output: output.clone() }),
            SchedulerConfig::from_host_config(&config),
        )
        .start();

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                output.send(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };
        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            output.send(&json!({"id": id, "error": "rate limit exceeded"}));
            continue;
        }

        let method = req.get("method").and_then(Value::as_str).unwrap_or("").to_string();
        let params = req.get("params").cloned().unwrap_or_else(|| json!({}));

        let handler_app = app.clone();
        let result = tokio::task::spawn_blocking(move || handle_method(&handler_app, &method, &params))
            .await
            .unwrap_or_else(|e| Err(format!("internal error: {}", e)));

        let response = match result {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        output.send(&response);
    }

    info!("stdin closed, shutting down");
    if let Err(e) = scheduler.shutdown().await {
        warn!(error = %e, "scheduler did not stop cleanly");
    }
    Ok(())
}
