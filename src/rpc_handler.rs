//! RPC method handler for the LinkShelf JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested without a
//! process. `handle_method` dispatches a method call to the managers held
//! by [`App`]. Every failure comes back as an error string and is logged
//! here; nothing below this boundary reaches the UI as a panic.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::app::App;
use crate::managers::category_manager::CategoryManagerTrait;
use crate::managers::link_manager::LinkManagerTrait;
use crate::services::backup::{BackupService, BackupServiceTrait};
use crate::services::scheduler::ARCHIVE_WARNING_DAYS;
use crate::services::settings_manager::SettingsManagerTrait;
use crate::services::url_validation::validate_saveable_url;
use crate::types::category::Category;
use crate::types::link::{
    DuplicatePolicy, LinkPatch, LinkQuery, LinkUpdate, PendingSave, SavedLink,
};
use crate::types::settings::ReorderMode;

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    debug!(method, "rpc call");
    dispatch(app, method, params).inspect_err(|e| warn!(method, error = %e, "rpc call failed"))
}

fn dispatch(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Links ───
        "link.save" => {
            let raw_url = str_param(params, "url")?;
            validate_saveable_url(raw_url).map_err(|e| e.to_string())?;

            let timestamp = match params.get("timestamp").and_then(Value::as_i64) {
                Some(ts) => ts,
                None => app.links.now(),
            };
            let mut link = SavedLink::new(
                raw_url.trim(),
                opt_str(params, "title").unwrap_or(""),
                opt_str(params, "note").unwrap_or(""),
                timestamp,
            );
            if let Some(categories) = opt_param::<Vec<String>>(params, "categories")? {
                link.categories = categories;
            }
            link.reminder_days = opt_param(params, "reminderDays")?;
            let policy: DuplicatePolicy = opt_param(params, "onDuplicate")?.unwrap_or_default();

            let outcome = app.links.save_link(link, policy).map_err(|e| e.to_string())?;
            to_json(&outcome)
        }
        "link.resolve_conflict" => {
            let pending: PendingSave = param(params, "pending")?;
            validate_saveable_url(&pending.incoming.url).map_err(|e| e.to_string())?;
            let overwrite = opt_param::<bool>(params, "overwrite")?.unwrap_or(false);
            let saved = app
                .links
                .resolve_conflict(pending, overwrite)
                .map_err(|e| e.to_string())?;
            Ok(json!({"saved": saved}))
        }
        "link.get" => {
            let url = str_param(params, "url")?;
            let link = app.links.get_link(url).map_err(|e| e.to_string())?;
            to_json(&link)
        }
        "link.list" => {
            let links = match opt_str(params, "view").unwrap_or("active") {
                "active" => app.links.active_links(),
                "archived" => app.links.archived_links(),
                "trash" => app.links.trashed_links(),
                "all" => app.links.get_all_links(),
                other => return Err(format!("unknown view: {}", other)),
            }
            .map_err(|e| e.to_string())?;
            Ok(json!({"items": links}))
        }
        "link.query" => {
            let query: LinkQuery =
                serde_json::from_value(params.clone()).map_err(|e| format!("invalid query: {}", e))?;
            let links = app.links.query_active(&query).map_err(|e| e.to_string())?;
            Ok(json!({"items": links}))
        }
        "link.update" => {
            let url = str_param(params, "url")?;
            let patch: LinkPatch = param(params, "patch")?;
            let link = app.links.update_link(url, &patch).map_err(|e| e.to_string())?;
            to_json(&link)
        }
        "link.batch_update" => {
            let updates: Vec<LinkUpdate> = param(params, "updates")?;
            let updated = app.links.batch_update(&updates).map_err(|e| e.to_string())?;
            Ok(json!({"updated": updated}))
        }
        "link.delete" => {
            let url = str_param(params, "url")?;
            app.links.delete_link(url).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.trash" => {
            let url = str_param(params, "url")?;
            app.links.move_to_trash(url).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.restore_trash" => {
            let url = str_param(params, "url")?;
            let restored = app.links.restore_from_trash(url).map_err(|e| e.to_string())?;
            Ok(json!({"restored": restored}))
        }
        "link.archive" => {
            let url = str_param(params, "url")?;
            app.links.move_to_archive(url).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.restore_archive" => {
            let url = str_param(params, "url")?;
            let restored = app.links.restore_from_archive(url).map_err(|e| e.to_string())?;
            Ok(json!({"restored": restored}))
        }
        "link.batch_archive" => {
            let urls: Vec<String> = param(params, "urls")?;
            let archived = app.links.batch_archive(&urls).map_err(|e| e.to_string())?;
            Ok(json!({"archived": archived}))
        }
        "link.empty_trash" => {
            let removed = app.links.empty_trash().map_err(|e| e.to_string())?;
            Ok(json!({"removed": removed}))
        }
        "link.pin" => {
            let url = str_param(params, "url")?;
            let pinned = match opt_param::<bool>(params, "pinned")? {
                Some(pinned) => {
                    app.links.set_pinned(url, pinned).map_err(|e| e.to_string())?;
                    pinned
                }
                None => app.links.toggle_pin(url).map_err(|e| e.to_string())?,
            };
            Ok(json!({"pinned": pinned}))
        }
        "link.open" => {
            let url = str_param(params, "url")?;
            app.links.mark_opened(url).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "link.reorder" => {
            let urls: Vec<String> = param(params, "urls")?;
            let updated = app.links.reorder(&urls).map_err(|e| e.to_string())?;
            Ok(json!({"updated": updated}))
        }
        "link.archiving_soon" => {
            let warn_days = opt_param::<u32>(params, "warnDays")?.unwrap_or(ARCHIVE_WARNING_DAYS);
            let settings = app.settings.archive_settings().map_err(|e| e.to_string())?;
            let links = app
                .links
                .archiving_soon(settings.archive_days, &settings.excluded_categories, warn_days)
                .map_err(|e| e.to_string())?;
            Ok(json!({"items": links}))
        }

        // ─── Categories ───
        "category.list" => {
            let categories = app.categories.list_categories().map_err(|e| e.to_string())?;
            Ok(json!({"items": categories}))
        }
        "category.save" => {
            let categories = match opt_str(params, "id") {
                Some(_) => {
                    let category: Category = serde_json::from_value(params.clone())
                        .map_err(|e| format!("invalid category: {}", e))?;
                    app.categories.save_category(category).map_err(|e| e.to_string())?
                }
                None => {
                    let name = str_param(params, "name")?;
                    app.categories
                        .create_category(name, opt_str(params, "color"), opt_str(params, "icon"))
                        .map_err(|e| e.to_string())?;
                    app.categories.list_categories().map_err(|e| e.to_string())?
                }
            };
            Ok(json!({"items": categories}))
        }
        "category.delete" => {
            let id = str_param(params, "id")?;
            app.categories.delete_category(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let settings = app.settings.get_settings().map_err(|e| e.to_string())?;
            to_json(&settings)
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let settings = app.settings.set_value(key, value).map_err(|e| e.to_string())?;
            to_json(&settings)
        }
        "settings.reset" => {
            app.settings.reset().map_err(|e| e.to_string())?;
            let settings = app.settings.get_settings().map_err(|e| e.to_string())?;
            to_json(&settings)
        }
        "onboarding.get" => {
            let seen = app.settings.has_seen_onboarding().map_err(|e| e.to_string())?;
            Ok(json!({"seen": seen}))
        }
        "onboarding.complete" => {
            app.settings.mark_onboarding_seen().map_err(|e| e.to_string())?;
            Ok(json!({"seen": true}))
        }
        "reorder.get" => {
            let mode = app.settings.reorder_mode().map_err(|e| e.to_string())?;
            Ok(json!({"mode": mode}))
        }
        "reorder.set" => {
            let mode = match opt_param::<ReorderMode>(params, "mode")? {
                Some(mode) => {
                    app.settings.set_reorder_mode(mode).map_err(|e| e.to_string())?;
                    mode
                }
                None => app.settings.toggle_reorder_mode().map_err(|e| e.to_string())?,
            };
            Ok(json!({"mode": mode}))
        }

        // ─── Backup ───
        "backup.export" => {
            let backup = app.backup.export().map_err(|e| e.to_string())?;
            Ok(json!({
                "fileName": BackupService::file_name(backup.timestamp),
                "backup": backup,
            }))
        }
        "backup.import" => {
            let content = str_param(params, "content")?;
            let summary = app.backup.import_json(content).map_err(|e| e.to_string())?;
            to_json(&summary)
        }

        // ─── Badge ───
        "badge.get" => Ok(json!({"text": app.badge.text()})),

        _ => Err(format!("unknown method: {}", method)),
    }
}

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    opt_str(params, key).ok_or_else(|| format!("missing {}", key))
}

fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

fn param<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, String> {
    opt_param(params, key)?.ok_or_else(|| format!("missing {}", key))
}

/// Decodes `params[key]`; absent and `null` both read as `None`.
fn opt_param<T: DeserializeOwned>(params: &Value, key: &str) -> Result<Option<T>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| format!("invalid {}: {}", key, e)),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}
