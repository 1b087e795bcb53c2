use anyhow::Result;
use cantus_core::model::{Event, EventId};
use cantus_core::schema::Database;
use chrono::Utc;
use std::path::PathBuf;

use super::{open_database, read_json_records};
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum EventCommand {
    /// Insert or refresh events from a JSON calendar export
    Sync { file: PathBuf },
    /// List all events, latest first
    List,
    /// Show the current event and past ones
    Overview,
    /// Delete an event (fails while attendance is recorded)
    Delete { id: String },
}

pub fn run(config: &Config, command: EventCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        EventCommand::Sync { file } => {
            let events: Vec<Event> = read_json_records(&file)?;
            let now = Utc::now();
            for mut event in events {
                event.last_sync_at = now;
                db.upsert_event(&event)?;
            }
            println!("✓ Synced events from {}", file.display());
        }
        EventCommand::List => {
            for event in db.list_events()? {
                print_event(&db, &event)?;
            }
        }
        EventCommand::Overview => {
            let overview = db.event_overview(Utc::now())?;
            match &overview.current {
                Some(event) => {
                    println!("Current:");
                    print_event(&db, event)?;
                }
                None => println!("No upcoming event."),
            }
            if !overview.past.is_empty() {
                println!("\nPast:");
                for event in &overview.past {
                    print_event(&db, event)?;
                }
            }
        }
        EventCommand::Delete { id } => {
            db.delete_event(&EventId::new(id.as_str()))?;
            println!("✓ Deleted event {id}");
        }
    }
    Ok(())
}

fn print_event(db: &Database, event: &Event) -> Result<()> {
    let present = db.count_attendance_for_event(&event.id)?;
    println!(
        "  {}  {:<30} {:<20} {:>3} present  {}",
        event.start.format("%Y-%m-%d %H:%M"),
        event.summary,
        event.location.as_deref().unwrap_or("-"),
        present,
        event.id
    );
    Ok(())
}
