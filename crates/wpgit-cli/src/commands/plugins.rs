//! Plugin lifecycle commands: add, remove, list, show, refs, branch

use colored::Colorize;
use dialoguer::Confirm;
use wpgit_core::{ManagedPlugin, PluginHost, PluginStatus, PluginView};

use super::{print_json, short};
use crate::context::AppContext;
use crate::error::{CliError, Result};

pub fn run_add(ctx: &AppContext, url: &str, branch: Option<&str>, slug: Option<&str>) -> Result<()> {
    if !ctx.json {
        println!("{} Adding {}...", "=>".blue().bold(), url.cyan());
    }
    let plugin = ctx.manager.add_plugin(url, branch, slug)?;
    if ctx.json {
        return print_json(&plugin);
    }
    println!(
        "{} Added {} tracking {} at {}",
        "OK".green().bold(),
        plugin.slug.cyan(),
        plugin.branch.cyan(),
        short(&plugin.local_commit)
    );
    if plugin.wp_plugin_name.is_empty() {
        println!(
            "   {} no WordPress plugin header found",
            "warning:".yellow().bold()
        );
    }
    Ok(())
}

pub fn run_remove(ctx: &AppContext, slug: &str, delete_files: bool, yes: bool) -> Result<()> {
    if delete_files && !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete the working tree of {slug}?"))
            .default(false)
            .interact()?;
        if !confirmed {
            return Err(CliError::user("Aborted"));
        }
    }
    let removed = ctx.manager.remove_plugin(slug, delete_files)?;
    if ctx.json {
        return print_json(&removed);
    }
    let detail = if delete_files {
        "files deleted"
    } else {
        "files kept"
    };
    println!(
        "{} Removed {} ({})",
        "OK".green().bold(),
        removed.slug.cyan(),
        detail
    );
    Ok(())
}

pub fn run_list(ctx: &AppContext) -> Result<()> {
    let plugins = ctx.manager.get_all_plugins()?;
    if ctx.json {
        return print_json(&plugins);
    }
    if plugins.is_empty() {
        println!(
            "{} (use {} to add one)",
            "No managed plugins".dimmed(),
            "wpgit add".cyan()
        );
        return Ok(());
    }

    println!("{}", "Managed Plugins".bold());
    println!();
    for view in &plugins {
        let plugin = &view.plugin;
        let active = if view.is_active {
            "active".green()
        } else {
            "inactive".dimmed()
        };
        println!(
            "  {} {} {} @ {} [{}] {}",
            status_marker(plugin.status),
            plugin.slug.cyan(),
            plugin.wp_plugin_version.dimmed(),
            plugin.branch,
            status_label(plugin.status),
            active
        );
    }
    Ok(())
}

pub fn run_show(ctx: &AppContext, slug: &str) -> Result<()> {
    let view = ctx.manager.get_plugin(slug)?;
    if ctx.json {
        return print_json(&view);
    }
    print_view(&view);
    Ok(())
}

pub fn run_refs(ctx: &AppContext, slug: &str) -> Result<()> {
    let refs = ctx.manager.get_refs(slug)?;
    if ctx.json {
        return print_json(&refs);
    }
    let marker = |name: &str| {
        if name == refs.current {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        }
    };
    println!("{}:", "Branches".bold());
    for branch in &refs.branches {
        println!("  {} {}", marker(branch), branch);
    }
    println!("{}:", "Tags".bold());
    if refs.tags.is_empty() {
        println!("  {}", "None".dimmed());
    }
    for tag in &refs.tags {
        println!("  {} {}", marker(tag), tag);
    }
    Ok(())
}

pub fn run_branch(ctx: &AppContext, slug: &str, reference: &str) -> Result<()> {
    if !ctx.json {
        println!(
            "{} Switching {} to {}...",
            "=>".blue().bold(),
            slug.cyan(),
            reference.cyan()
        );
    }
    let plugin = ctx.manager.change_branch(slug, reference)?;
    if ctx.json {
        return print_json(&plugin);
    }
    println!(
        "{} {} now tracks {} at {}",
        "OK".green().bold(),
        plugin.slug.cyan(),
        plugin.branch.cyan(),
        short(&plugin.local_commit)
    );
    Ok(())
}

pub fn run_toggle_auto_sync(ctx: &AppContext, slug: &str, enabled: bool) -> Result<()> {
    let plugin = ctx.manager.toggle_auto_sync(slug, enabled)?;
    if ctx.json {
        return print_json(&plugin);
    }
    let state = if plugin.auto_sync {
        "enabled".green()
    } else {
        "disabled".yellow()
    };
    println!(
        "{} Auto-sync {} for {}",
        "OK".green().bold(),
        state,
        plugin.slug.cyan()
    );
    Ok(())
}

pub fn run_activate(ctx: &AppContext, slug: &str) -> Result<()> {
    let view = ctx.manager.get_plugin(slug)?;
    if view.plugin.wp_plugin_file.is_empty() {
        return Err(CliError::user(format!(
            "{slug} has no WordPress plugin header and cannot be activated"
        )));
    }
    ctx.host.activate(&view.plugin.wp_plugin_file)?;
    report_activation(ctx, slug, true)
}

pub fn run_deactivate(ctx: &AppContext, slug: &str) -> Result<()> {
    ctx.manager.get_plugin(slug)?;
    ctx.host.deactivate(slug)?;
    report_activation(ctx, slug, false)
}

fn report_activation(ctx: &AppContext, slug: &str, expected: bool) -> Result<()> {
    let active = ctx.host.is_active(slug)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "slug": slug, "is_active": active }));
    }
    if active != expected {
        return Err(CliError::user(format!("{slug} activation state did not change")));
    }
    let state = if active { "activated" } else { "deactivated" };
    println!("{} {} {}", "OK".green().bold(), slug.cyan(), state);
    Ok(())
}

pub(crate) fn print_view(view: &PluginView) {
    let plugin = &view.plugin;
    let name = if plugin.wp_plugin_name.is_empty() {
        plugin.slug.as_str()
    } else {
        plugin.wp_plugin_name.as_str()
    };
    println!("{}", name.bold());
    println!();
    println!("{}:       {}", "Slug".dimmed(), plugin.slug.cyan());
    println!("{}: {}", "Repository".dimmed(), plugin.repo_url);
    println!("{}:        {}", "Ref".dimmed(), plugin.branch.cyan());
    println!("{}:     {}", "Status".dimmed(), status_label(plugin.status));
    if let Some(error) = &plugin.last_error {
        println!("{}:      {}", "Error".dimmed(), error.red());
    }
    if !plugin.wp_plugin_version.is_empty() {
        println!("{}:    {}", "Version".dimmed(), plugin.wp_plugin_version);
    }
    print_commits(plugin);
    println!(
        "{}:  {}",
        "Auto-sync".dimmed(),
        if plugin.auto_sync { "on" } else { "off" }
    );
    println!(
        "{}:    {}",
        "Private".dimmed(),
        if plugin.is_private { "yes" } else { "no" }
    );
    println!(
        "{}:     {}",
        "Active".dimmed(),
        if view.is_active { "yes" } else { "no" }
    );
    if let Some(synced) = plugin.last_sync {
        println!("{}:  {}", "Last sync".dimmed(), synced.to_rfc3339());
    }
}

fn print_commits(plugin: &ManagedPlugin) {
    if !plugin.local_commit.is_empty() {
        println!(
            "{}:      {} {}",
            "Local".dimmed(),
            short(&plugin.local_commit),
            plugin.last_commit_message.dimmed()
        );
    }
    if !plugin.remote_commit.is_empty() {
        println!("{}:     {}", "Remote".dimmed(), short(&plugin.remote_commit));
    }
}

fn status_marker(status: PluginStatus) -> colored::ColoredString {
    match status {
        PluginStatus::UpToDate => "+".green(),
        PluginStatus::UpdateAvailable => "^".yellow(),
        PluginStatus::Syncing => "~".blue(),
        PluginStatus::Error => "x".red(),
    }
}

pub(crate) fn status_label(status: PluginStatus) -> colored::ColoredString {
    match status {
        PluginStatus::UpToDate => "up to date".green(),
        PluginStatus::UpdateAvailable => "update available".yellow(),
        PluginStatus::Syncing => "syncing".blue(),
        PluginStatus::Error => "error".red(),
    }
}
