//! FiscalDash CLI - outgoing invoice dashboard in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, dashboard, export, legend, load, logs, report, FilterArgs};

/// FiscalDash - ICMS and CFOP analysis of outgoing invoice spreadsheets
#[derive(Parser)]
#[command(name = "fdash", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the data folder and show files, notices and totals
    Load {
        /// Folder with the .xlsx/.xls files (defaults to the configured folder)
        #[arg(long, short)]
        folder: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show metrics, aggregations and the CFOP x status pivot
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        /// Number of codes in the top-codes view
        #[arg(long)]
        top: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the filtered table as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file or directory (defaults to a timestamped file here)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive dashboard session
    Dashboard {
        /// Folder with the .xlsx/.xls files (defaults to the configured folder)
        #[arg(long, short)]
        folder: Option<PathBuf>,
    },

    /// Print the CFOP legend
    Legend {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Load { folder, json } => load::run(folder, json),
        Commands::Report { filters, top, json } => report::run(&filters, top, json),
        Commands::Export { filters, output, json } => export::run(&filters, output, json),
        Commands::Dashboard { folder } => dashboard::run(folder),
        Commands::Legend { json } => legend::run(json),
        Commands::Config { command } => config::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
