use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_edit::{table, value, DocumentMut};

/// Configuration for cantus.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CANTUS_* prefix)
/// 3. Config file (~/.config/cantus/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: CANTUS_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/cantus/cantus.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// How long a write waits for another process holding the database
    /// lock, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default)]
    pub logging: twyg::Opts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `config_path` (if it exists) and the
    /// environment.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cantus");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration, letting an explicit --db path win.
    pub fn load_with_db_path(db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::load()?;
        if let Some(db_path) = db_path {
            config.database_path = db_path;
        }
        Ok(config)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantus")
        .join("cantus.db")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cantus/config.toml
/// - macOS: ~/Library/Application Support/cantus/config.toml
/// - Windows: %APPDATA%\cantus\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cantus")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cantus Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CANTUS_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite database
#
# Can also be set via:
# - CLI: cantus --db /custom/path.db status
# - Environment: CANTUS_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/cantus.db"

# Milliseconds a write waits while another process holds the lock
busy_timeout_ms = 5000

[logging]
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    ensure_config_file_at(&config_file_path())
}

fn ensure_config_file_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

/// Keys accepted by `cantus config set`, with the TOML type they take.
const SETTABLE_KEYS: &[(&str, ValueKind)] = &[
    ("database_path", ValueKind::Text),
    ("busy_timeout_ms", ValueKind::Integer),
    ("logging.level", ValueKind::Text),
    ("logging.coloured", ValueKind::Bool),
];

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Text,
    Integer,
    Bool,
}

/// Set `key` to `raw` in the config file, keeping comments and layout.
pub fn set_value(key: &str, raw: &str) -> Result<PathBuf> {
    let config_path = config_file_path();
    ensure_config_file_at(&config_path)?;
    set_value_at(&config_path, key, raw)?;
    Ok(config_path)
}

fn set_value_at(config_path: &Path, key: &str, raw: &str) -> Result<()> {
    let kind = SETTABLE_KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| {
            let valid: Vec<_> = SETTABLE_KEYS.iter().map(|(name, _)| *name).collect();
            anyhow::anyhow!("Unknown config key: {key}\n\nValid keys: {}", valid.join(", "))
        })?;

    let new_value = match kind {
        ValueKind::Text => value(raw),
        ValueKind::Integer => value(
            raw.parse::<i64>()
                .with_context(|| format!("{key} takes an integer, got '{raw}'"))?,
        ),
        ValueKind::Bool => value(
            raw.parse::<bool>()
                .with_context(|| format!("{key} takes true or false, got '{raw}'"))?,
        ),
    };

    let contents = std::fs::read_to_string(config_path).context("Failed to read config file")?;
    let mut doc: DocumentMut = contents.parse().context("Failed to parse config file")?;

    match key.split_once('.') {
        Some((section, field)) => {
            let section_table = doc
                .entry(section)
                .or_insert(table())
                .as_table_mut()
                .ok_or_else(|| anyhow::anyhow!("'{section}' in config file is not a table"))?;
            section_table[field] = new_value;
        }
        None => doc[key] = new_value,
    }

    std::fs::write(config_path, doc.to_string()).context("Failed to write config file")?;
    Ok(())
}
