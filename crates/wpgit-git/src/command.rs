//! Argument-vector construction and execution of git subprocesses
//!
//! Commands are never assembled as shell strings. A [`Subcommand`] from a
//! closed set is combined with argument slices and run directly with
//! `std::process::Command` in a non-interactive environment.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::{Error, Result};

/// The git subcommands this crate is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Version,
    Clone,
    Fetch,
    Pull,
    Checkout,
    Reset,
    RevParse,
    RevList,
    Log,
    Status,
    Branch,
    Tag,
    Config,
}

impl Subcommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Clone => "clone",
            Self::Fetch => "fetch",
            Self::Pull => "pull",
            Self::Checkout => "checkout",
            Self::Reset => "reset",
            Self::RevParse => "rev-parse",
            Self::RevList => "rev-list",
            Self::Log => "log",
            Self::Status => "status",
            Self::Branch => "branch",
            Self::Tag => "tag",
            Self::Config => "config",
        }
    }

    /// Subcommands that talk to the remote and may need credentials.
    pub fn is_network(self) -> bool {
        matches!(self, Self::Clone | Self::Fetch | Self::Pull)
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful command output.
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub stdout: String,
}

impl GitOutput {
    /// Non-empty stdout lines, trimmed.
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }

    /// First stdout line, trimmed.
    pub fn first_line(&self) -> String {
        self.stdout.lines().next().unwrap_or("").trim().to_string()
    }
}

/// A single prepared git invocation.
pub(crate) struct Invocation<'a> {
    pub program: &'a Path,
    /// `-c key=value` pairs placed before the subcommand
    pub config: Vec<(String, String)>,
    pub subcommand: Subcommand,
    pub args: Vec<String>,
}

impl Invocation<'_> {
    /// Run the invocation in `cwd` and capture its output.
    pub fn run(self, cwd: &Path) -> Result<GitOutput> {
        // Config values may carry credentials; only the subcommand and its
        // arguments are logged or echoed in errors.
        let rendered = self.display();
        tracing::debug!(command = %rendered, cwd = %cwd.display(), "Running git");

        let mut command = Command::new(self.program);
        command.current_dir(cwd);
        for (key, value) in &self.config {
            command.arg("-c").arg(format!("{key}={value}"));
        }
        command
            .arg(self.subcommand.as_str())
            .args(&self.args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_ASKPASS", "")
            .env("SSH_ASKPASS", "")
            .env("GIT_SSH_COMMAND", "ssh -oBatchMode=yes")
            .env("LC_ALL", "C")
            .stdin(Stdio::null());

        let output = command.output().map_err(|e| Error::ToolUnavailable {
            program: self.program.display().to_string(),
            message: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(GitOutput { stdout });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = [stdout.trim(), stderr.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        tracing::debug!(command = %rendered, code = ?output.status.code(), "git command failed");

        Err(Error::CommandFailed {
            command: rendered,
            code: output.status.code(),
            output: combined,
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.subcommand.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
