//! Working-tree status of one plugin

use colored::Colorize;

use super::{print_json, short};
use crate::context::AppContext;
use crate::error::Result;

pub fn run_status(ctx: &AppContext, slug: &str) -> Result<()> {
    let state = ctx.manager.get_local_state(slug)?;
    if ctx.json {
        return print_json(&state);
    }

    println!("{}", format!("{slug} working tree").bold());
    println!();
    match &state.branch {
        Some(branch) => println!("{}:  {}", "Branch".dimmed(), branch.cyan()),
        None => println!("{}:  {}", "Branch".dimmed(), "detached".yellow()),
    }
    println!("{}:  {}", "Commit".dimmed(), short(&state.commit));
    println!("{}:  {}", "Remote".dimmed(), state.remote_url);
    if state.branch.is_some() {
        println!(
            "{}: {} ahead, {} behind",
            "Tracking".dimmed(),
            state.diff.ahead,
            state.diff.behind
        );
    }
    println!();

    if state.status.clean {
        println!("{} Working tree clean", "OK".green().bold());
    } else {
        println!(
            "{} {} local change(s), discarded on next sync:",
            "DIRTY".yellow().bold(),
            state.status.changes.len()
        );
        for change in &state.status.changes {
            println!("   {}", change);
        }
    }
    Ok(())
}
