//! WP Git Sync CLI
//!
//! Manage WordPress plugins installed straight from GitHub repositories.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, SettingsAction, TokenAction};
use context::AppContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{}: failed to initialise logging: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    let Some(command) = cli.command.clone() else {
        println!("{} WP Git Sync CLI", "wpgit".green().bold());
        println!();
        println!("Run {} for available commands.", "wpgit --help".cyan());
        return Ok(());
    };

    let ctx = AppContext::open(&cli)?;
    execute_command(&ctx, command)
}

fn execute_command(ctx: &AppContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Add { url, branch, slug } => {
            commands::run_add(ctx, &url, branch.as_deref(), slug.as_deref())
        }
        Commands::Remove {
            slug,
            delete_files,
            yes,
        } => commands::run_remove(ctx, &slug, delete_files, yes),
        Commands::Sync { slug } => commands::run_sync(ctx, &slug),
        Commands::Check { slug } => commands::run_check(ctx, &slug),
        Commands::CheckAll => commands::run_check_all(ctx),
        Commands::AutoSync => commands::run_auto_sync(ctx),
        Commands::ToggleAutoSync { slug, state } => {
            commands::run_toggle_auto_sync(ctx, &slug, state)
        }
        Commands::Branch { slug, reference } => commands::run_branch(ctx, &slug, &reference),
        Commands::Refs { slug } => commands::run_refs(ctx, &slug),
        Commands::List => commands::run_list(ctx),
        Commands::Show { slug } => commands::run_show(ctx, &slug),
        Commands::Status { slug } => commands::run_status(ctx, &slug),
        Commands::Activate { slug } => commands::run_activate(ctx, &slug),
        Commands::Deactivate { slug } => commands::run_deactivate(ctx, &slug),
        Commands::Export { slug } => commands::run_export(ctx, &slug),
        Commands::Exports => commands::run_list_exports(ctx),
        Commands::DeleteExport { filename } => commands::run_delete_export(ctx, &filename),
        Commands::CleanupExports => commands::run_cleanup_exports(ctx),
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::run_settings_show(ctx),
            SettingsAction::Set {
                interval,
                exclusions,
                clear_exclusions,
                cleanup_after,
            } => commands::run_settings_set(
                ctx,
                interval.as_deref(),
                exclusions,
                clear_exclusions,
                cleanup_after,
            ),
        },
        Commands::Token { action } => match action {
            TokenAction::Set { token, no_verify } => commands::run_token_set(ctx, token, no_verify),
            TokenAction::Verify { token } => commands::run_token_verify(ctx, token.as_deref()),
            TokenAction::Clear => commands::run_token_clear(ctx),
        },
    }
}
