//! Settings commands

use colored::Colorize;
use serde_json::json;
use wpgit_core::{Settings, SettingsUpdate, SyncInterval};
use wpgit_github::KeyStrength;

use super::print_json;
use crate::context::AppContext;
use crate::error::{CliError, Result};

pub fn run_settings_show(ctx: &AppContext) -> Result<()> {
    let settings = ctx.manager.get_settings()?;
    print_settings(ctx, &settings)
}

pub fn run_settings_set(
    ctx: &AppContext,
    interval: Option<&str>,
    exclusions: Vec<String>,
    clear_exclusions: bool,
    cleanup_after: Option<u32>,
) -> Result<()> {
    let update = SettingsUpdate {
        auto_sync_interval: interval.map(str::parse::<SyncInterval>).transpose()?,
        export_exclusions: if clear_exclusions {
            Some(Vec::new())
        } else if exclusions.is_empty() {
            None
        } else {
            Some(exclusions)
        },
        cleanup_exports_after: cleanup_after,
    };
    if update == SettingsUpdate::default() {
        return Err(CliError::user(
            "Nothing to change; pass --interval, --exclude, --clear-exclusions or --cleanup-after",
        ));
    }

    let settings = ctx.manager.update_settings(update)?;
    if !ctx.json {
        println!("{} Settings saved", "OK".green().bold());
        println!();
    }
    print_settings(ctx, &settings)
}

/// Print settings without the encrypted token itself.
fn print_settings(ctx: &AppContext, settings: &Settings) -> Result<()> {
    let token_configured = !settings.github_token.is_empty();
    let default_key = ctx.manager.key_strength() == KeyStrength::Default;

    if ctx.json {
        return print_json(&json!({
            "auto_sync_interval": settings.auto_sync_interval,
            "export_exclusions": settings.export_exclusions,
            "cleanup_exports_after": settings.cleanup_exports_after,
            "token_configured": token_configured,
            "default_encryption_key": default_key,
            "plugins_dir": ctx.manager.plugins_root(),
            "export_dir": ctx.config.export_dir(),
        }));
    }

    println!("{}", "Settings".bold());
    println!();
    println!(
        "{}:   {}",
        "Auto-sync".dimmed(),
        settings.auto_sync_interval.as_str().cyan()
    );
    println!(
        "{}: {} hours",
        "Keep exports".dimmed(),
        settings.cleanup_exports_after
    );
    println!(
        "{}:       {}",
        "Token".dimmed(),
        if token_configured {
            "configured".green()
        } else {
            "not set".dimmed()
        }
    );
    if default_key {
        println!(
            "   {} no site secret configured; set {} to protect the stored token",
            "warning:".yellow().bold(),
            crate::context::SITE_SECRET_ENV.cyan()
        );
    }
    println!(
        "{}:     {}",
        "Plugins".dimmed(),
        ctx.manager.plugins_root().display()
    );
    println!(
        "{}:     {}",
        "Exports".dimmed(),
        ctx.config.export_dir().display()
    );
    println!();
    println!("{}:", "Export exclusions".bold());
    if settings.export_exclusions.is_empty() {
        println!("  {} (only .git is left out)", "None".dimmed());
    }
    for pattern in &settings.export_exclusions {
        println!("  {} {}", "-".dimmed(), pattern);
    }
    Ok(())
}
