// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Precedence, highest first:
//! 1. Command line flags
//! 2. `PSYJOURNAL_*` environment variables
//! 3. `config.toml` (platform config dir, or `--config`)
//! 4. Defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PSYJOURNAL";

/// Keys accepted by `config <key> [value]`
pub const KEYS: [&str; 5] = [
    "data_dir",
    "substances_path",
    "timeline_weight",
    "interaction_window_hours",
    "log_level",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `journal.json`
    pub data_dir: PathBuf,
    /// External substance dataset; the bundled one when unset
    #[serde(default)]
    pub substances_path: Option<PathBuf>,
    /// Where between minimum and maximum durations timelines are drawn
    pub timeline_weight: f64,
    /// How far back `ingest` looks for interacting substances
    pub interaction_window_hours: u32,
    /// Log level when neither `-v`, `-q` nor `RUST_LOG` is given
    #[serde(default)]
    pub log_level: Option<String>,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "psychonautwiki", "psychonaut-journal")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: project_dirs()
                .map(|d| d.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".psychonaut-journal")),
            substances_path: None,
            timeline_weight: crate::timeline::DEFAULT_WEIGHT,
            interaction_window_hours: 48,
            log_level: None,
        }
    }
}

impl Config {
    /// Path of the user config file
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|d| d.config_dir().join("config.toml"))
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.timeline_weight) {
            anyhow::bail!(
                "timeline_weight must be between 0 and 1, got {}",
                self.timeline_weight
            );
        }
        Ok(())
    }
}

/// Load configuration from defaults, the config file and the environment
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = Config::default();
    let mut builder = ::config::Config::builder()
        .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
        .set_default("timeline_weight", defaults.timeline_weight)?
        .set_default("interaction_window_hours", i64::from(defaults.interaction_window_hours))?;

    let file = path.map(Path::to_path_buf).or_else(Config::default_path);
    if let Some(file) = &file {
        debug!("Reading configuration from {}", file.display());
        builder = builder.add_source(
            ::config::File::from(file.as_path())
                .format(::config::FileFormat::Toml)
                .required(false),
        );
    }

    let config: Config = builder
        .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;
    config.validate()?;
    Ok(config)
}

/// Read a key from a config file, `None` when unset
pub fn get_key(file: &Path, key: &str) -> Result<Option<String>> {
    check_key(key)?;
    let table = read_table(file)?;
    Ok(table.get(key).map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Write a key to a config file, creating it if needed
pub fn set_key(file: &Path, key: &str, value: &str) -> Result<()> {
    check_key(key)?;
    let parsed = match key {
        "timeline_weight" => {
            let weight: f64 = value
                .parse()
                .with_context(|| format!("timeline_weight must be a number, got '{value}'"))?;
            if !(0.0..=1.0).contains(&weight) {
                anyhow::bail!("timeline_weight must be between 0 and 1, got {weight}");
            }
            toml::Value::Float(weight)
        }
        "interaction_window_hours" => {
            let hours: u32 = value.parse().with_context(|| {
                format!("interaction_window_hours must be a whole number, got '{value}'")
            })?;
            toml::Value::Integer(i64::from(hours))
        }
        _ => toml::Value::String(value.to_string()),
    };

    let mut table = read_table(file)?;
    table.insert(key.to_string(), parsed);

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&table).context("Failed to serialize configuration")?;
    fs::write(file, content).with_context(|| format!("Failed to write {}", file.display()))
}

fn check_key(key: &str) -> Result<()> {
    if KEYS.contains(&key) {
        Ok(())
    } else {
        anyhow::bail!("Unknown config key: {}. Valid: {}", key, KEYS.join(", "))
    }
}

fn read_table(file: &Path) -> Result<toml::Table> {
    if !file.exists() {
        return Ok(toml::Table::new());
    }
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    content
        .parse::<toml::Table>()
        .with_context(|| format!("Failed to parse {}", file.display()))
}
