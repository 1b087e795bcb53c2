use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;

use commands::{
    attendance::AttendanceCommand, config::ConfigCommand, drive_file::DriveFileCommand,
    event::EventCommand, setlist::SetlistCommand, singer::SingerCommand, song::SongCommand,
    user::UserCommand,
};
use config::Config;

#[derive(Debug, Parser)]
#[command(name = "cantus", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/cantus/cantus.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage choir members and their voice groups
    Singer {
        #[command(subcommand)]
        command: SingerCommand,
    },
    /// Manage the song catalog and its file links
    ///
    /// Song names are unique. `song import` reads one name per line from a
    /// text file; names that already exist are reported and skipped.
    Song {
        #[command(subcommand)]
        command: SongCommand,
    },
    /// Build ordered setlists
    ///
    /// Each entry is identified by setlist, song and position, so the same
    /// song may appear more than once at different positions.
    Setlist {
        #[command(subcommand)]
        command: SetlistCommand,
    },
    /// Mirror rehearsals and concerts from a calendar export
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Record who attended which event
    ///
    /// Singers and events with attendance records cannot be deleted until
    /// those records are cleared.
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommand,
    },
    /// Register users and issue invite tokens
    ///
    /// The first user registers without a token; every later registration
    /// consumes an unused, unexpired invite.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Mirror file metadata from the shared drive folder
    DriveFile {
        #[command(subcommand)]
        command: DriveFileCommand,
    },
    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Show row counts of the database
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_with_db_path(cli.db)?;

    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e:?}"))?;
    log::debug!("Using database {}", config.database_path.display());

    match cli.command {
        Commands::Singer { command } => commands::singer::run(&config, command),
        Commands::Song { command } => commands::song::run(&config, command),
        Commands::Setlist { command } => commands::setlist::run(&config, command),
        Commands::Event { command } => commands::event::run(&config, command),
        Commands::Attendance { command } => commands::attendance::run(&config, command),
        Commands::User { command } => commands::user::run(&config, command),
        Commands::DriveFile { command } => commands::drive_file::run(&config, command),
        Commands::Config { command } => commands::config::run(&config, command),
        Commands::Status => commands::status::show_status(&config),
    }
}
