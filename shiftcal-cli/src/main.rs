mod commands;
mod render;
mod utils;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shiftcal_core::config::SettingsCache;

/// How long a loaded configuration is trusted before it is read again
const SETTINGS_TTL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "shiftcal")]
#[command(about = "Mirror your service schedule into a calendar and keep it in sync")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the target calendar with your service records
    Sync {
        /// Sync into this calendar instead of the configured one.
        ///
        /// Events already linked elsewhere stay where they are and count as
        /// up to date; use `migrate` to move them.
        #[arg(short, long)]
        calendar: Option<String>,
    },
    /// Move every mirrored event to another calendar
    Migrate {
        /// Calendar to move to
        #[arg(long)]
        to: String,

        /// Calendar to move from (defaults to the configured one)
        #[arg(long)]
        from: Option<String>,
    },
    /// List the calendars the provider can write to
    Calendars,
    /// Delete a service record together with its calendar events
    Delete { record_id: String },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut settings = SettingsCache::at_default_path(SETTINGS_TTL)?;

    match cli.command {
        Commands::Sync { calendar } => commands::sync::run(&mut settings, calendar.as_deref()).await,
        Commands::Migrate { to, from } => {
            commands::migrate::run(&mut settings, &to, from.as_deref()).await
        }
        Commands::Calendars => commands::calendars::run(&mut settings).await,
        Commands::Delete { record_id } => commands::delete::run(&mut settings, &record_id).await,
        Commands::Config => commands::config::run(&mut settings),
    }
}
