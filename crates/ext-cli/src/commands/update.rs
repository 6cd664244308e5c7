//! Check and update command implementations

use colored::Colorize;

use ext_engine::{CheckStatus, UpdateEngine, UpdateOutcome, UpdateTarget};

use crate::error::{CliError, Result};

/// Run the check command
///
/// Resolves remote versions and reports which extensions are stale.
pub async fn run_check(engine: &UpdateEngine, names: &[String]) -> Result<()> {
    let filter = if names.is_empty() { None } else { Some(names) };
    let reports = engine.check(filter).await?;

    if reports.is_empty() {
        println!("Nothing to check.");
        return Ok(());
    }

    let mut stale = 0usize;
    for report in &reports {
        match &report.status {
            CheckStatus::UpToDate => {
                println!("{} {} is up to date", "OK".green().bold(), report.name.cyan());
            }
            CheckStatus::UpdateAvailable { local, remote } => {
                stale += 1;
                println!(
                    "{} {} {} -> {}",
                    "STALE".yellow().bold(),
                    report.name.cyan(),
                    local,
                    remote.bold()
                );
            }
            CheckStatus::CheckFailed => {
                println!(
                    "{} {} remote version unavailable",
                    "FAILED".red().bold(),
                    report.name.cyan()
                );
            }
            CheckStatus::NoSource => {
                println!(
                    "{} {} has no remote source",
                    "SKIP".dimmed(),
                    report.name.cyan()
                );
            }
            CheckStatus::NotFound => {
                println!(
                    "{} no extension named {}",
                    "FAILED".red().bold(),
                    report.name.cyan()
                );
            }
        }
    }

    if stale > 0 {
        println!();
        println!("Run {} to install updates.", "extup update --all".cyan());
    }
    Ok(())
}

/// Run the update command
///
/// Prints one line per attempted extension and fails with a non-zero exit
/// when any update did not complete.
pub async fn run_update(engine: &UpdateEngine, target: UpdateTarget) -> Result<()> {
    let reports = engine.update(target).await?;

    if reports.is_empty() {
        println!("{} Everything is already up to date.", "OK".green().bold());
        return Ok(());
    }

    let mut failed = 0usize;
    for report in &reports {
        match &report.outcome {
            UpdateOutcome::Updated { from, to } => {
                println!(
                    "{} {} updated {} -> {}",
                    "OK".green().bold(),
                    report.name.cyan(),
                    from,
                    to.bold()
                );
            }
            UpdateOutcome::AlreadyUpToDate => {
                println!(
                    "{} {} is already up to date",
                    "OK".green().bold(),
                    report.name.cyan()
                );
            }
            UpdateOutcome::NotFound => {
                failed += 1;
                println!(
                    "{} no extension named {}",
                    "FAILED".red().bold(),
                    report.name.cyan()
                );
            }
            UpdateOutcome::NotUpdatable => {
                failed += 1;
                println!(
                    "{} {} has no remote source",
                    "FAILED".red().bold(),
                    report.name.cyan()
                );
            }
            UpdateOutcome::CheckFailed => {
                failed += 1;
                println!(
                    "{} {} remote version unavailable",
                    "FAILED".red().bold(),
                    report.name.cyan()
                );
            }
            UpdateOutcome::StagingFailed { reason } => {
                failed += 1;
                println!(
                    "{} {} download failed: {}",
                    "FAILED".red().bold(),
                    report.name.cyan(),
                    reason
                );
            }
            UpdateOutcome::BackupFailed { reason } => {
                failed += 1;
                println!(
                    "{} {} backup failed, nothing changed: {}",
                    "FAILED".red().bold(),
                    report.name.cyan(),
                    reason
                );
            }
            UpdateOutcome::RolledBack { reason } => {
                failed += 1;
                println!(
                    "{} {} failed and was rolled back: {}",
                    "FAILED".red().bold(),
                    report.name.cyan(),
                    reason
                );
            }
            UpdateOutcome::Corrupted {
                reason,
                rollback_error,
            } => {
                failed += 1;
                println!(
                    "{} {} is in an indeterminate state (install: {}; rollback: {})",
                    "CORRUPT".red().bold(),
                    report.name.cyan(),
                    reason,
                    rollback_error
                );
                println!(
                    "   The {} directory next to it holds the previous files.",
                    ".backup".yellow()
                );
            }
        }
    }

    if failed > 0 {
        return Err(CliError::user(format!(
            "{failed} of {} update(s) failed",
            reports.len()
        )));
    }
    Ok(())
}
