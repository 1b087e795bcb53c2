use anyhow::{Context, Result};
use cantus_core::import::parse_song_names;
use cantus_core::model::{DriveFileId, LinkType, MusicalKey, Song, SongFileLink, SongId};
use cantus_core::schema::Database;
use std::path::{Path, PathBuf};

use super::open_database;
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum SongCommand {
    /// Add a song
    Add {
        name: String,
        /// Key, e.g. C, F#, Bb
        #[arg(long)]
        key: Option<MusicalKey>,
        #[arg(long)]
        notes: Option<String>,
        /// Read lyrics from a text file
        #[arg(long)]
        lyrics: Option<PathBuf>,
    },
    /// Import song names from a text file, one per line
    Import { file: PathBuf },
    /// List songs
    List {
        /// Also show file links
        #[arg(long)]
        links: bool,
    },
    /// Remove a song together with its setlist entries and links
    Remove { id: SongId },
    /// Attach a file link to a song, replacing one with the same label
    Link {
        song: SongId,
        /// One of Audio, AudioRecording, AudioPracticeTrack,
        /// AudioInitialNotes, Video, PDF, MuseScore, Other
        #[arg(value_name = "TYPE")]
        link_type: LinkType,
        label: String,
        url: String,
        /// Drive file this link points at
        #[arg(long)]
        drive_file: Option<String>,
    },
    /// Remove a file link by label
    Unlink { song: SongId, label: String },
}

pub fn run(config: &Config, command: SongCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        SongCommand::Add {
            name,
            key,
            notes,
            lyrics,
        } => {
            let mut song = Song::new(name);
            song.key = key;
            song.notes = notes;
            if let Some(path) = lyrics {
                song.lyrics = Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                );
            }
            db.insert_song(&song)?;
            println!("✓ Added '{}' as {}", song.name, song.id);
        }
        SongCommand::Import { file } => import_songs(&db, &file)?,
        SongCommand::List { links } => list_songs(&db, links)?,
        SongCommand::Remove { id } => {
            db.delete_song(id)?;
            println!("✓ Removed song {id}");
        }
        SongCommand::Link {
            song,
            link_type,
            label,
            url,
            drive_file,
        } => link_file(&db, song, link_type, label, url, drive_file)?,
        SongCommand::Unlink { song, label } => {
            db.delete_song_file_link(song, &label)?;
            println!("✓ Removed link '{label}'");
        }
    }
    Ok(())
}

fn import_songs(db: &Database, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let names = parse_song_names(&text);
    let report = db.import_songs(&names)?;

    for song in &report.created {
        println!("  + {}", song.name);
    }
    for failure in &report.failures {
        println!("  ✗ {failure}");
    }
    println!(
        "\n✓ Imported {} of {} songs",
        report.created.len(),
        names.len()
    );
    Ok(())
}

fn list_songs(db: &Database, with_links: bool) -> Result<()> {
    let songs = db.list_songs_with_links()?;
    if songs.is_empty() {
        println!("No songs.");
        return Ok(());
    }

    for entry in &songs {
        let key = entry.song.key.map_or("-", MusicalKey::as_str);
        println!("{:<40} {:<3} {}", entry.song.name, key, entry.song.id);
        if with_links {
            for link in &entry.file_links {
                println!("    [{}] {} -> {}", link.link_type, link.label, link.url);
            }
        }
    }
    println!("\n{} songs", songs.len());
    Ok(())
}

fn link_file(
    db: &Database,
    song_id: SongId,
    link_type: LinkType,
    label: String,
    url: String,
    drive_file: Option<String>,
) -> Result<()> {
    let mut link = SongFileLink::new(song_id, link_type, label, url);
    if let Some(id) = drive_file {
        link = link.with_drive_file(DriveFileId::new(id));
    }

    let mut links: Vec<_> = db
        .list_song_file_links(song_id)?
        .into_iter()
        .filter(|existing| existing.label != link.label)
        .collect();
    links.push(link);
    db.replace_song_file_links(song_id, &links)?;

    println!("✓ Song {song_id} now has {} links", links.len());
    Ok(())
}
