pub mod commands;

use clap::{Parser, Subcommand};
use clinicdesk_core::config::{AppConfig, LoadOptions, LogFormat};
use std::process::ExitCode;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "clinicdesk",
    about = "ClinicDesk scheduling operator CLI",
    long_about = "Inspect clinic schedule configuration, generated slots, availability, and the demo appointment workflow.",
    after_help = "Examples:\n  clinicdesk doctor --json\n  clinicdesk slots --date 2026-10-19\n  clinicdesk seed"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, per-day slot generation, and break windows")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the generated slot labels for a date")]
    Slots {
        #[arg(long, help = "Calendar date as YYYY-MM-DD")]
        date: String,
    },
    #[command(about = "Compute slot availability for a date over the demo appointments")]
    Availability {
        #[arg(long, help = "Calendar date as YYYY-MM-DD")]
        date: String,
    },
    #[command(about = "Load demo appointments, decide the pending ones, and report the outcome")]
    Seed,
}

/// Logs go to stderr so stdout carries only command output.
fn init_logging() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Slots { date } => commands::slots::run(&date),
        Command::Availability { date } => commands::availability::run(&date),
        Command::Seed => commands::seed::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
