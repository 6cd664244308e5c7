//! Settings and status command implementations

use colored::Colorize;

use ext_engine::{EngineConfig, UpdateEngine};

use crate::error::{CliError, Result};

/// Show every stored auto-update preference.
pub fn run_settings_show(engine: &UpdateEngine) -> Result<()> {
    let prefs = engine.preferences();
    let entries: Vec<_> = prefs.entries().collect();
    if entries.is_empty() {
        println!("No preferences stored. Auto-update defaults to off.");
        return Ok(());
    }

    println!("{} Auto-update preferences:", "=>".blue().bold());
    for (name, enabled) in entries {
        let state = if enabled { "on".green() } else { "off".dimmed() };
        println!("   {} {} {}", "-".blue(), name.cyan(), state);
    }
    Ok(())
}

/// Change one extension's auto-update preference.
pub fn run_settings_set(engine: &UpdateEngine, name: &str, state: &str) -> Result<()> {
    let enabled = match state {
        "on" => true,
        "off" => false,
        other => {
            return Err(CliError::user(format!(
                "invalid state {other:?}, expected \"on\" or \"off\""
            )));
        }
    };

    let records = engine.list()?;
    let Some(record) = records
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
    else {
        return Err(CliError::user(format!("no extension named {name:?}")));
    };

    let mut prefs = engine.preferences();
    prefs.set_auto_update(&record.name, enabled)?;
    println!(
        "{} auto-update for {} is now {}",
        "OK".green().bold(),
        record.name.cyan(),
        if enabled { "on".green() } else { "off".dimmed() }
    );
    Ok(())
}

/// Show the effective configuration and credential state.
pub fn run_status(config: &EngineConfig) -> Result<()> {
    println!("{} Extension updater status", "=>".blue().bold());
    println!("   root:          {}", config.root.display());
    println!(
        "   credentials:   {}",
        if config.token().is_some() {
            format!("token configured for {}", config.github.username)
                .green()
        } else {
            "anonymous (low rate limits)".yellow()
        }
    );
    println!(
        "   admin gate:    {}",
        if config.admin.allowed_ids.is_empty() {
            "open (no allow-list)".dimmed()
        } else {
            format!("{} allowed id(s)", config.admin.allowed_ids.len()).normal()
        }
    );
    println!("   rate limit:    one call per {:?}", config.min_interval());
    println!(
        "   downloads:     {} concurrent, {} attempt(s) per file",
        config.download.concurrency, config.download.retries
    );
    Ok(())
}
