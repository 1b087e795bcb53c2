use anyhow::{Context, Result};

use crate::config::{self, Config};

#[derive(Debug, clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Create the config file with defaults if missing
    Init,
    /// Print an example config file
    Example,
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the raw config file
    Cat,
}

pub fn run(config: &Config, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Path => {
            println!("{}", config::config_file_path().display());
            Ok(())
        }
        ConfigCommand::Init => init_config(),
        ConfigCommand::Example => {
            print!("{}", config::example_config());
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let path = config::set_value(&key, &value)?;
            println!("✓ Updated {} = {}", key, value);
            println!("  in {}", path.display());
            Ok(())
        }
        ConfigCommand::Cat => cat_config(),
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  busy_timeout_ms: {}", config.busy_timeout_ms);
    println!("  logging.level: {:?}", config.logging.level());
    println!("  logging.coloured: {}", config.logging.coloured());

    println!("\nPriority: CLI args > ENV vars (CANTUS_*) > Config file > Defaults");

    Ok(())
}

fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure cantus.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

fn cat_config() -> Result<()> {
    let config_path = config::config_file_path();

    if config_path.exists() {
        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        print!("{}", contents);
    } else {
        println!("Config file does not exist: {}", config_path.display());
        println!("\nRun 'cantus config init' to create it.");
    }

    Ok(())
}
