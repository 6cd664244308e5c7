//! List and info command implementations

use colored::Colorize;

use ext_engine::UpdateEngine;

use crate::error::Result;

/// Run the list command
///
/// Prints every installed extension with its local version and whether
/// auto-update is enabled for it.
pub fn run_list(engine: &UpdateEngine) -> Result<()> {
    let records = engine.list()?;
    if records.is_empty() {
        println!("No extensions installed under {:?}.", engine.config().root);
        return Ok(());
    }

    let prefs = engine.preferences();
    println!(
        "{} {} extension(s) installed:",
        "=>".blue().bold(),
        records.len()
    );
    for record in &records {
        let auto = if prefs.auto_update(&record.name) {
            "auto-update".green()
        } else {
            "manual".dimmed()
        };
        let source = if record.updatable() {
            record.source_url.as_str().dimmed()
        } else {
            "no source".yellow()
        };
        println!(
            "   {} {} ({}) [{}] {}",
            "-".blue(),
            record.name.cyan(),
            record.local_version,
            auto,
            source
        );
    }
    Ok(())
}

/// Run the info command
pub async fn run_info(engine: &UpdateEngine, name: &str) -> Result<()> {
    let Some(record) = engine.info(name).await? else {
        println!("{} No extension named {}.", "?".yellow().bold(), name.cyan());
        return Ok(());
    };

    println!("{} {}", "=>".blue().bold(), record.name.cyan().bold());
    println!("   directory:      {}", record.directory_name);
    println!("   local version:  {}", record.local_version);
    match &record.remote_version {
        Some(remote) if record.needs_update() => {
            println!("   remote version: {} {}", remote, "(update available)".yellow());
        }
        Some(remote) => println!("   remote version: {}", remote),
        None if record.updatable() => {
            println!("   remote version: {}", "unavailable".red());
        }
        None => println!("   remote version: {}", "no source".dimmed()),
    }
    if record.updatable() {
        println!("   source:         {}", record.source_url);
    }
    println!(
        "   auto-update:    {}",
        if engine.preferences().auto_update(&record.name) {
            "on".green()
        } else {
            "off".dimmed()
        }
    );
    Ok(())
}
