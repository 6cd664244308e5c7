//! Extension Updater CLI
//!
//! The command-line interface for checking and updating locally installed
//! extensions.

mod cli;
mod commands;
mod error;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::{CliError, Result};
use ext_engine::{EngineConfig, UpdateEngine, UpdateTarget};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let mut cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command.take() {
        Some(cmd) => {
            let config = resolve_config(&cli)?;
            execute_command(cmd, config, cli.user.as_deref()).await
        }
        None => {
            // No command provided - show help hint
            println!("{} Extension Updater CLI", "extup".green().bold());
            println!();
            println!("Run {} for available commands.", "extup --help".cyan());
            Ok(())
        }
    }
}

async fn execute_command(cmd: Commands, config: EngineConfig, user: Option<&str>) -> Result<()> {
    match cmd {
        Commands::List => {
            let engine = UpdateEngine::new(config);
            commands::run_list(&engine)
        }
        Commands::Check { names } => {
            let engine = UpdateEngine::new(config);
            commands::run_check(&engine, &names).await
        }
        Commands::Update { name, all: _ } => {
            ensure_admin(&config, user)?;
            let target = match name {
                // The literal target ALL means everything, same as --all.
                Some(name) if name == "ALL" => UpdateTarget::All,
                Some(name) => UpdateTarget::Named(name),
                None => UpdateTarget::All,
            };
            let engine = UpdateEngine::new(config);
            commands::run_update(&engine, target).await
        }
        Commands::Info { name } => {
            let engine = UpdateEngine::new(config);
            commands::run_info(&engine, &name).await
        }
        Commands::Settings { name, state } => {
            let engine = match (name, state) {
                (Some(name), Some(state)) => {
                    ensure_admin(&config, user)?;
                    let engine = UpdateEngine::new(config);
                    return commands::run_settings_set(&engine, &name, &state);
                }
                (Some(name), None) => {
                    return Err(CliError::user(format!(
                        "missing state for {name:?}, expected \"on\" or \"off\""
                    )));
                }
                (None, _) => UpdateEngine::new(config),
            };
            commands::run_settings_show(&engine)
        }
        Commands::Status => commands::run_status(&config),
    }
}

/// Resolve the effective configuration from flags, the environment, and the
/// default `config.toml` next to the process.
fn resolve_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => {
            let default = Path::new("config.toml");
            if default.exists() {
                EngineConfig::load(default)?
            } else if let Some(root) = &cli.root {
                EngineConfig::for_root(root.clone())
            } else {
                return Err(CliError::user(
                    "no config.toml found; pass --config or --root",
                ));
            }
        }
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

/// Destructive commands are gated on the configured admin allow-list.
fn ensure_admin(config: &EngineConfig, user: Option<&str>) -> Result<()> {
    let user = user.unwrap_or("");
    if config.is_admin(user) {
        return Ok(());
    }
    Err(CliError::user(if user.is_empty() {
        "this command requires an admin identity; pass --user".to_string()
    } else {
        format!("user {user:?} is not on the admin allow-list")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn config_with_admins(ids: &[&str]) -> EngineConfig {
        let mut config = EngineConfig::for_root("/tmp/extensions");
        config.admin.allowed_ids = ids.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        config
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        let config = config_with_admins(&[]);
        assert!(ensure_admin(&config, None).is_ok());
        assert!(ensure_admin(&config, Some("anyone")).is_ok());
    }

    #[test]
    fn allow_list_rejects_unlisted_users() {
        let config = config_with_admins(&["ops"]);
        assert!(ensure_admin(&config, Some("ops")).is_ok());
        assert!(ensure_admin(&config, Some("guest")).is_err());
        assert!(ensure_admin(&config, None).is_err());
    }

    #[test]
    fn root_flag_overrides_configured_root() {
        let cli = Cli::parse_from(["extup", "--root", "/srv/ext", "list"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.root, std::path::PathBuf::from("/srv/ext"));
    }
}
