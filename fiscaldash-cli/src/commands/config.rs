//! Config command - show and change settings

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use fiscaldash_core::config::{Config, DATA_FOLDER_ENV};
use fiscaldash_core::{EntryPoint, LogEvent, SemanticField};

use super::{default_folder, get_app_dir, get_logger, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the default data folder
    SetFolder {
        /// Folder with the .xlsx/.xls files
        folder: PathBuf,
    },
    /// Set how many codes the top-codes view shows
    SetTop {
        /// Number of codes (at least 1)
        count: usize,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let app_dir = get_app_dir();
    std::fs::create_dir_all(&app_dir)?;
    let mut config = Config::load(&app_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            let env_set = std::env::var(DATA_FOLDER_ENV).is_ok_and(|v| !v.trim().is_empty());
            let folder_source = if env_set {
                DATA_FOLDER_ENV
            } else if config.data_folder.is_some() {
                "settings"
            } else {
                "default"
            };
            let folder = config.data_folder.clone().unwrap_or_else(default_folder);

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "appDir": app_dir.to_string_lossy(),
                        "dataFolder": folder.to_string_lossy(),
                        "dataFolderSource": folder_source,
                        "topCodes": config.top_codes,
                        "extraColumns": config.extra_columns,
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Settings".bold());
            println!("  App directory: {}", app_dir.display());
            println!("  Data folder: {} ({})", folder.display(), folder_source);
            println!("  Top codes: {}", config.top_codes);
            for field in SemanticField::ALL {
                if let Some(extra) = config.extra_columns.get(&field) {
                    println!("  Extra {} columns: {}", field.label(), extra.join(", "));
                }
            }
        }
        ConfigCommands::SetFolder { folder } => {
            if !folder.is_dir() {
                output::warning(&format!("Folder does not exist yet: {}", folder.display()));
            }
            config.set_data_folder(folder.clone());
            config.save(&app_dir)?;
            log_event(
                &get_logger(EntryPoint::Cli),
                LogEvent::new("config_changed").with_command("config set-folder"),
            );
            output::success(&format!("Data folder set to {}", folder.display()));
        }
        ConfigCommands::SetTop { count } => {
            if count == 0 {
                bail!("Top codes must be at least 1");
            }
            config.set_top_codes(count);
            config.save(&app_dir)?;
            log_event(
                &get_logger(EntryPoint::Cli),
                LogEvent::new("config_changed").with_command("config set-top"),
            );
            output::success(&format!("Top codes set to {}", count));
        }
    }

    Ok(())
}
