//! Sync and update-check commands

use colored::Colorize;

use super::{batch_json, batch_outcome, print_json, short};
use crate::context::AppContext;
use crate::error::Result;

/// Fetch and fast-forward one plugin.
pub fn run_sync(ctx: &AppContext, slug: &str) -> Result<()> {
    if !ctx.json {
        println!("{} Syncing {}...", "=>".blue().bold(), slug.cyan());
    }
    let plugin = ctx.manager.sync_plugin(slug)?;
    if ctx.json {
        return print_json(&plugin);
    }
    println!(
        "{} {} at {} ({})",
        "OK".green().bold(),
        plugin.slug.cyan(),
        short(&plugin.local_commit),
        plugin.branch
    );
    Ok(())
}

pub fn run_check(ctx: &AppContext, slug: &str) -> Result<()> {
    let check = ctx.manager.check_updates(slug)?;
    if ctx.json {
        return print_json(&check);
    }
    if check.has_update {
        println!(
            "{} {} {} -> {}",
            "UPDATE".yellow().bold(),
            slug.cyan(),
            short(&check.local_commit),
            short(&check.remote_commit)
        );
    } else {
        println!(
            "{} {} is up to date ({})",
            "OK".green().bold(),
            slug.cyan(),
            short(&check.local_commit)
        );
    }
    Ok(())
}

/// Check every plugin. Exits non-zero when any check failed.
pub fn run_check_all(ctx: &AppContext) -> Result<()> {
    if !ctx.json {
        println!("{} Checking all plugins for updates...", "=>".blue().bold());
    }
    let results = ctx.manager.check_all_updates()?;
    if ctx.json {
        print_json(&batch_json(&results)?)?;
        return batch_outcome(&results, "Update check");
    }

    if results.is_empty() {
        println!("{}", "No managed plugins".dimmed());
    }
    for (slug, result) in &results {
        match result {
            Ok(check) if check.has_update => println!(
                "   {} {} {} -> {}",
                "UPDATE".yellow().bold(),
                slug.cyan(),
                short(&check.local_commit),
                short(&check.remote_commit)
            ),
            Ok(_) => println!("   {} {}", "OK".green().bold(), slug.cyan()),
            Err(e) => println!("   {} {}: {}", "FAILED".red().bold(), slug.cyan(), e),
        }
    }
    batch_outcome(&results, "Update check")
}

/// Sync plugins with auto-sync enabled; meant to be run by a scheduler.
pub fn run_auto_sync(ctx: &AppContext) -> Result<()> {
    let results = ctx.manager.sync_auto_enabled()?;
    if ctx.json {
        print_json(&batch_json(&results)?)?;
        return batch_outcome(&results, "Auto-sync");
    }

    if results.is_empty() {
        println!("{}", "No plugins have auto-sync enabled".dimmed());
    }
    for (slug, result) in &results {
        match result {
            Ok(plugin) => println!(
                "   {} {} at {}",
                "OK".green().bold(),
                slug.cyan(),
                short(&plugin.local_commit)
            ),
            Err(e) => println!("   {} {}: {}", "FAILED".red().bold(), slug.cyan(), e),
        }
    }
    batch_outcome(&results, "Auto-sync")
}
