use anyhow::Result;
use cantus_core::model::{Setlist, SetlistEntryKey, SetlistId, SetlistSongInfo, SongId};
use cantus_core::schema::Database;

use super::open_database;
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum SetlistCommand {
    /// Create an empty setlist
    Create {
        name: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List setlists, newest first
    List,
    /// Show the songs of a setlist in order
    Show { id: SetlistId },
    /// Add a song, at the end unless a position is given
    Add {
        setlist: SetlistId,
        song: SongId,
        #[arg(long)]
        order: Option<i32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Move an entry to another position
    Move {
        setlist: SetlistId,
        song: SongId,
        from: i32,
        to: i32,
    },
    /// Remove the entry at a position
    RemoveEntry {
        setlist: SetlistId,
        song: SongId,
        order: i32,
    },
    /// Delete a setlist and all its entries
    Delete { id: SetlistId },
}

pub fn run(config: &Config, command: SetlistCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        SetlistCommand::Create { name, notes } => {
            let mut setlist = Setlist::new(name);
            setlist.notes = notes;
            db.insert_setlist(&setlist)?;
            println!("✓ Created setlist '{}' ({})", setlist.name, setlist.id);
        }
        SetlistCommand::List => list_setlists(&db)?,
        SetlistCommand::Show { id } => show_setlist(&db, id)?,
        SetlistCommand::Add {
            setlist,
            song,
            order,
            notes,
        } => {
            let entry = match order {
                Some(order) => {
                    let mut entry =
                        SetlistSongInfo::new(SetlistEntryKey::new(setlist, song, order));
                    entry.notes = notes;
                    db.add_setlist_entry(&entry)?;
                    entry
                }
                None => db.append_to_setlist(setlist, song, notes)?,
            };
            println!("✓ Added song {} at position {}", song, entry.key.order);
        }
        SetlistCommand::Move {
            setlist,
            song,
            from,
            to,
        } => {
            let moved = db.move_setlist_entry(SetlistEntryKey::new(setlist, song, from), to)?;
            println!("✓ Moved song {} to position {}", song, moved.key.order);
        }
        SetlistCommand::RemoveEntry {
            setlist,
            song,
            order,
        } => {
            db.remove_setlist_entry(SetlistEntryKey::new(setlist, song, order))?;
            println!("✓ Removed song {song} at position {order}");
        }
        SetlistCommand::Delete { id } => {
            db.delete_setlist(id)?;
            println!("✓ Deleted setlist {id}");
        }
    }
    Ok(())
}

fn list_setlists(db: &Database) -> Result<()> {
    let setlists = db.list_setlists()?;
    if setlists.is_empty() {
        println!("No setlists.");
        return Ok(());
    }
    for setlist in &setlists {
        let entries = db.list_setlist_entries(setlist.id)?;
        println!(
            "{:<30} {:>3} songs  {}  {}",
            setlist.name,
            entries.len(),
            setlist.created_at.format("%Y-%m-%d"),
            setlist.id
        );
    }
    Ok(())
}

fn show_setlist(db: &Database, id: SetlistId) -> Result<()> {
    let setlist = db.get_setlist(id)?;
    println!("{}", setlist.name);
    if let Some(notes) = &setlist.notes {
        println!("  {notes}");
    }
    println!();

    for entry in db.list_setlist_entries(id)? {
        let song = db.get_song(entry.key.song_id)?;
        let key = song.key.map(|k| format!(" ({k})")).unwrap_or_default();
        print!("{:>3}. {}{}", entry.key.order, song.name, key);
        match &entry.notes {
            Some(notes) => println!("  - {notes}"),
            None => println!(),
        }
    }
    Ok(())
}
