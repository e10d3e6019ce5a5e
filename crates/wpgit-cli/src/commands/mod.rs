//! Command implementations for wpgit-cli

pub mod export;
pub mod plugins;
pub mod settings;
pub mod status;
pub mod sync;
pub mod token;

pub use export::{run_cleanup_exports, run_delete_export, run_export, run_list_exports};
pub use plugins::{
    run_activate, run_add, run_branch, run_deactivate, run_list, run_refs, run_remove, run_show,
    run_toggle_auto_sync,
};
pub use settings::{run_settings_set, run_settings_show};
pub use status::run_status;
pub use sync::{run_auto_sync, run_check, run_check_all, run_sync};
pub use token::{run_token_clear, run_token_set, run_token_verify};

use serde::Serialize;
use serde_json::{Value, json};
use wpgit_core::BatchResults;

use crate::error::{CliError, Result};

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON object keyed by slug; failures become `{ "error", "kind" }`.
pub(crate) fn batch_json<T: Serialize>(results: &BatchResults<T>) -> Result<Value> {
    let mut map = serde_json::Map::new();
    for (slug, result) in results {
        let value = match result {
            Ok(value) => serde_json::to_value(value)?,
            Err(e) => json!({ "error": e.to_string(), "kind": e.kind() }),
        };
        map.insert(slug.clone(), value);
    }
    Ok(Value::Object(map))
}

/// Turn a batch with failures into a non-zero exit.
pub(crate) fn batch_outcome<T>(results: &BatchResults<T>, what: &str) -> Result<()> {
    let failed = results.values().filter(|r| r.is_err()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{what} failed for {failed} of {} plugins",
            results.len()
        )))
    }
}

/// First seven characters of a commit hash.
pub(crate) fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}
