use anyhow::Result;
use cantus_core::model::{Singer, SingerId, VoiceGroup};
use cantus_core::schema::Database;

use super::open_database;
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum SingerCommand {
    /// Add a singer
    Add {
        first_name: String,
        last_name: String,
        /// One of S1, S2, S2_M, A1_M, A1, A2, T1, T2, B1, B2, D
        #[arg(long)]
        voice: VoiceGroup,
        #[arg(long)]
        email: Option<String>,
    },
    /// List singers, optionally only one voice group
    List {
        #[arg(long)]
        voice: Option<VoiceGroup>,
    },
    /// Change a singer's voice group
    SetVoice { id: SingerId, voice: VoiceGroup },
    /// Remove a singer (fails while attendance is recorded)
    Remove { id: SingerId },
}

pub fn run(config: &Config, command: SingerCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        SingerCommand::Add {
            first_name,
            last_name,
            voice,
            email,
        } => {
            let mut singer = Singer::new(first_name, last_name, voice);
            if let Some(email) = email {
                singer = singer.with_email(email);
            }
            db.insert_singer(&singer)?;
            println!("✓ Added {} ({}) as {}", singer.full_name(), singer.voice_group, singer.id);
        }
        SingerCommand::List { voice } => list_singers(&db, voice)?,
        SingerCommand::SetVoice { id, voice } => {
            db.set_voice_group(id, voice)?;
            println!("✓ {id} now sings {voice}");
        }
        SingerCommand::Remove { id } => {
            db.delete_singer(id)?;
            println!("✓ Removed singer {id}");
        }
    }
    Ok(())
}

fn list_singers(db: &Database, voice: Option<VoiceGroup>) -> Result<()> {
    let singers: Vec<_> = db
        .list_singers()?
        .into_iter()
        .filter(|s| voice.map_or(true, |v| s.voice_group == v))
        .collect();

    if singers.is_empty() {
        println!("No singers.");
        return Ok(());
    }

    for singer in &singers {
        println!(
            "{:<5} {:<30} {:<30} {}",
            singer.voice_group.as_str(),
            singer.full_name(),
            singer.email.as_deref().unwrap_or("-"),
            singer.id
        );
    }
    println!("\n{} singers", singers.len());
    Ok(())
}
