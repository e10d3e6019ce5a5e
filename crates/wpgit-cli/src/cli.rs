//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// WP Git Sync - Manage WordPress plugins straight from GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "wpgit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "WPGIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the plugin working trees
    #[arg(long, global = true, env = "WPGIT_PLUGINS_DIR")]
    pub plugins_dir: Option<PathBuf>,

    /// Directory holding persisted state
    #[arg(long, global = true, env = "WPGIT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Clone a GitHub repository and start managing it as a plugin
    ///
    /// Examples:
    ///   wpgit add https://github.com/acme/widget
    ///   wpgit add git@github.com:acme/widget.git --branch develop
    ///   wpgit add https://github.com/acme/widget --slug widget-dev
    Add {
        /// github.com repository URL (HTTPS or SSH)
        url: String,

        /// Branch or tag to track (defaults to the repository default branch)
        #[arg(short, long)]
        branch: Option<String>,

        /// Directory name for the plugin (defaults to the repository name)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Stop managing a plugin
    Remove {
        slug: String,

        /// Also delete the working tree from disk
        #[arg(long)]
        delete_files: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Fetch and fast-forward a plugin to its tracked ref
    Sync { slug: String },

    /// Check one plugin for upstream changes
    Check { slug: String },

    /// Check every managed plugin for upstream changes
    CheckAll,

    /// Sync every plugin with auto-sync enabled
    AutoSync,

    /// Enable or disable auto-sync for a plugin
    ToggleAutoSync {
        slug: String,

        /// `on` or `off`
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        state: bool,
    },

    /// Switch the tracked branch or tag and sync
    Branch {
        slug: String,

        /// Branch or tag name
        reference: String,
    },

    /// List remote branches and tags
    Refs { slug: String },

    /// List managed plugins
    List,

    /// Show one managed plugin
    Show { slug: String },

    /// Show working-tree state of a plugin
    Status { slug: String },

    /// Mark a managed plugin active
    Activate { slug: String },

    /// Mark a managed plugin inactive
    Deactivate { slug: String },

    /// Build an installable zip of a plugin
    Export { slug: String },

    /// List export archives
    Exports,

    /// Delete an export archive
    DeleteExport { filename: String },

    /// Delete exports older than the retention window
    CleanupExports,

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage the GitHub access token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    /// Print current settings
    Show,

    /// Change one or more settings
    Set {
        /// hourly, twicedaily or daily
        #[arg(long)]
        interval: Option<String>,

        /// Export exclusion pattern (repeatable; replaces the list)
        #[arg(long = "exclude")]
        exclusions: Vec<String>,

        /// Empty the export exclusion list
        #[arg(long, conflicts_with = "exclusions")]
        clear_exclusions: bool,

        /// Hours to keep export archives (1-168)
        #[arg(long)]
        cleanup_after: Option<u32>,
    },
}

/// Token subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
    /// Store a token (prompts when omitted)
    Set {
        token: Option<String>,

        /// Skip verification against the GitHub API
        #[arg(long)]
        no_verify: bool,
    },

    /// Verify the stored token, or the given one
    Verify { token: Option<String> },

    /// Remove the stored token
    Clear,
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" | "enable" => Ok(true),
        "off" | "false" | "no" | "0" | "disable" => Ok(false),
        other => Err(format!("expected `on` or `off`, got `{other}`")),
    }
}
