//! Export archive commands

use colored::Colorize;

use super::print_json;
use crate::context::AppContext;
use crate::error::Result;

pub fn run_export(ctx: &AppContext, slug: &str) -> Result<()> {
    if !ctx.json {
        println!("{} Exporting {}...", "=>".blue().bold(), slug.cyan());
    }
    let archive = ctx.exports().export_plugin(slug)?;
    if ctx.json {
        return print_json(&archive);
    }
    println!(
        "{} {} ({})",
        "OK".green().bold(),
        archive.file_path.display(),
        human_size(archive.size_bytes)
    );
    if let Some(url) = &archive.download_url {
        println!("   {}", url.cyan());
    }
    Ok(())
}

pub fn run_list_exports(ctx: &AppContext) -> Result<()> {
    let engine = ctx.exports();
    let archives = engine.list_exports()?;
    if ctx.json {
        return print_json(&archives);
    }
    if archives.is_empty() {
        println!(
            "{} in {}",
            "No exports".dimmed(),
            engine.export_dir().display()
        );
        return Ok(());
    }
    println!("{}", "Exports".bold());
    println!();
    for archive in &archives {
        println!(
            "  {} {:>9}  {}",
            archive.filename.cyan(),
            human_size(archive.size_bytes),
            archive.created_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    Ok(())
}

pub fn run_delete_export(ctx: &AppContext, filename: &str) -> Result<()> {
    ctx.exports().delete_export(filename)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "deleted": filename }));
    }
    println!("{} Deleted {}", "OK".green().bold(), filename.cyan());
    Ok(())
}

pub fn run_cleanup_exports(ctx: &AppContext) -> Result<()> {
    let removed = ctx.exports().cleanup_old_exports()?;
    if ctx.json {
        return print_json(&serde_json::json!({ "removed": removed }));
    }
    println!(
        "{} Removed {} expired export(s)",
        "OK".green().bold(),
        removed
    );
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
