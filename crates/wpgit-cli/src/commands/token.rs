//! GitHub token commands

use colored::Colorize;
use dialoguer::Password;
use serde_json::json;
use wpgit_github::TokenOwner;

use super::print_json;
use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Store a token, verifying it first unless `no_verify` is set.
pub fn run_token_set(ctx: &AppContext, token: Option<String>, no_verify: bool) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => Password::new()
            .with_prompt("GitHub personal access token")
            .interact()?,
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::user(
            "Token is empty; use `wpgit token clear` to remove the stored token",
        ));
    }

    let owner = if no_verify {
        None
    } else {
        Some(ctx.manager.verify_token(Some(token))?)
    };
    ctx.manager.set_token(token)?;

    if ctx.json {
        return print_json(&json!({ "stored": true, "owner": owner }));
    }
    match owner {
        Some(owner) => println!(
            "{} Token stored for {}",
            "OK".green().bold(),
            describe(&owner).cyan()
        ),
        None => println!("{} Token stored (not verified)", "OK".green().bold()),
    }
    Ok(())
}

pub fn run_token_verify(ctx: &AppContext, token: Option<&str>) -> Result<()> {
    let owner = ctx.manager.verify_token(token)?;
    if ctx.json {
        return print_json(&owner);
    }
    println!(
        "{} Token valid for {}",
        "OK".green().bold(),
        describe(&owner).cyan()
    );
    Ok(())
}

pub fn run_token_clear(ctx: &AppContext) -> Result<()> {
    ctx.manager.set_token("")?;
    if ctx.json {
        return print_json(&json!({ "stored": false }));
    }
    println!("{} Token removed", "OK".green().bold());
    Ok(())
}

fn describe(owner: &TokenOwner) -> String {
    match &owner.name {
        Some(name) if !name.is_empty() => format!("{} ({name})", owner.login),
        _ => owner.login.clone(),
    }
}
