use anyhow::Result;
use chrono::Utc;

use super::open_database;
use crate::config::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let db = open_database(config)?;

    let singers = db.list_singers()?.len();
    let songs = db.count_songs()?;
    let setlists = db.list_setlists()?.len();
    let overview = db.event_overview(Utc::now())?;
    let users = db.count_users()?;

    println!("\nCantus Status\n");
    println!("  Database: {}", config.database_path.display());
    println!("  Singers:  {}", singers);
    println!("  Songs:    {}", songs);
    println!("  Setlists: {}", setlists);
    println!("  Users:    {}", users);
    println!("  Past events: {}", overview.past.len());

    match overview.current {
        Some(event) => println!(
            "  Next event:  {} on {}",
            event.summary,
            event.start.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  Next event:  none"),
    }

    if users == 0 {
        println!("\n  Run `cantus user register` to create the first account");
    }

    Ok(())
}
