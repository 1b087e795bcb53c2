use anyhow::{bail, Result};
use cantus_core::model::{AttendanceKey, EventId, SingerId};
use cantus_core::schema::{AttendanceOutcome, Database};

use super::open_database;
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum AttendanceCommand {
    /// Mark singers as present at an event
    Record {
        event: String,
        #[arg(required = true)]
        singers: Vec<SingerId>,
    },
    /// List attendees of an event, or the events a singer attended
    List {
        #[arg(long, conflicts_with = "singer", required_unless_present = "singer")]
        event: Option<String>,
        #[arg(long)]
        singer: Option<SingerId>,
    },
    /// Remove attendance records
    ///
    /// With both --singer and --event one record is removed; with only one
    /// of them every record of that singer or event is removed.
    Clear {
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        singer: Option<SingerId>,
    },
}

pub fn run(config: &Config, command: AttendanceCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        AttendanceCommand::Record { event, singers } => {
            let event_id = EventId::new(event);
            for singer_id in singers {
                let key = AttendanceKey::new(singer_id, event_id.clone());
                match db.mark_present(&key)? {
                    AttendanceOutcome::Recorded => println!("✓ {singer_id} present"),
                    AttendanceOutcome::AlreadyRecorded => {
                        println!("  {singer_id} was already recorded");
                    }
                }
            }
        }
        AttendanceCommand::List { event, singer } => match (event, singer) {
            (Some(event), _) => list_attendees(&db, &EventId::new(event))?,
            (None, Some(singer)) => list_history(&db, singer)?,
            (None, None) => bail!("Pass --event or --singer"),
        },
        AttendanceCommand::Clear { event, singer } => {
            let event = event.map(EventId::new);
            match (singer, event) {
                (Some(singer), Some(event)) => {
                    db.remove_attendance(&AttendanceKey::new(singer, event))?;
                    println!("✓ Removed one attendance record");
                }
                (Some(singer), None) => {
                    let removed = db.clear_attendance_for_singer(singer)?;
                    println!("✓ Removed {removed} attendance records of {singer}");
                }
                (None, Some(event)) => {
                    let removed = db.clear_attendance_for_event(&event)?;
                    println!("✓ Removed {removed} attendance records of {event}");
                }
                (None, None) => bail!("Pass --singer, --event or both"),
            }
        }
    }
    Ok(())
}

fn list_attendees(db: &Database, event_id: &EventId) -> Result<()> {
    let event = db.get_event(event_id)?;
    let attendees = db.list_attendees(event_id)?;
    println!(
        "{} on {}: {} present\n",
        event.summary,
        event.start.format("%Y-%m-%d"),
        attendees.len()
    );
    for singer in &attendees {
        println!("  {:<5} {}", singer.voice_group.as_str(), singer.full_name());
    }
    Ok(())
}

fn list_history(db: &Database, singer_id: SingerId) -> Result<()> {
    let singer = db.get_singer(singer_id)?;
    let records = db.list_attendance_for_singer(singer_id)?;
    println!("{} attended {} events\n", singer.full_name(), records.len());
    for record in &records {
        let event = db.get_event(&record.key.event_id)?;
        println!(
            "  {}  {}",
            event.start.format("%Y-%m-%d"),
            event.summary
        );
    }
    Ok(())
}
