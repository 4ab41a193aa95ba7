// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod color;
pub mod completions;
pub mod config;
pub mod custom;
pub mod experience;
pub mod export;
pub mod ingest;
pub mod ingestion;
pub mod interactions;
pub mod search;
pub mod stats;
pub mod substance;
pub mod timeline;

use crate::color::SubstanceColor;
use crate::config::Config;
use crate::dose::DoseClass;
use crate::interaction::{InteractionGraph, InteractionType};
use crate::journal::Journal;
use crate::substance::SubstanceRepo;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Everything a command needs from the global flags and configuration
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Effective configuration
    pub config: Config,
    /// Config file used by `config <key>`
    pub config_path: Option<PathBuf>,
    /// Print JSON instead of text
    pub json: bool,
    /// Use terminal colors
    pub color: bool,
}

impl AppContext {
    /// Load the reference dataset, bundled unless configured otherwise
    pub fn repo(&self) -> Result<SubstanceRepo> {
        match &self.config.substances_path {
            Some(path) => {
                debug!("Loading substances from {}", path.display());
                SubstanceRepo::from_path(path)
                    .with_context(|| format!("Failed to load substances from {}", path.display()))
            }
            None => SubstanceRepo::bundled().context("Failed to parse bundled substance data"),
        }
    }

    /// Resolve the dataset's interactions
    pub fn interactions(&self, repo: &SubstanceRepo) -> Result<InteractionGraph> {
        InteractionGraph::build(repo).context("Failed to resolve interactions")
    }

    /// Load the journal from the data directory
    pub fn load_journal(&self) -> Result<Journal> {
        Journal::load(&self.config.data_dir).with_context(|| {
            format!("Failed to load journal from {}", self.config.data_dir.display())
        })
    }

    /// Save the journal to the data directory
    pub fn save_journal(&self, journal: &Journal) -> Result<()> {
        journal.save(&self.config.data_dir)
    }

    /// Print a value as pretty JSON
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{json}");
        Ok(())
    }

    /// Apply a style when colors are enabled
    #[must_use]
    pub fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Bold heading
    #[must_use]
    pub fn heading(&self, text: &str) -> String {
        self.paint(text, Style::new().bold())
    }

    /// Muted secondary text
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        self.paint(text, Style::new().dimmed())
    }

    /// Text in a substance's companion color
    #[must_use]
    pub fn substance(&self, name: &str, color: Option<SubstanceColor>) -> String {
        match color {
            Some(color) => {
                let (r, g, b) = color.rgb();
                self.paint(name, Style::new().truecolor(r, g, b).bold())
            }
            None => self.paint(name, Style::new().bold()),
        }
    }

    /// Interaction label colored by severity
    #[must_use]
    pub fn severity(&self, kind: InteractionType) -> String {
        let style = match kind {
            InteractionType::Dangerous => Style::new().red().bold(),
            InteractionType::Unsafe => Style::new().yellow().bold(),
            InteractionType::Uncertain => Style::new().cyan(),
        };
        self.paint(&kind.to_string().to_uppercase(), style)
    }

    /// Dose class gauge, e.g. `●●○○ common`
    #[must_use]
    pub fn dose_class(&self, class: Option<DoseClass>) -> String {
        match class {
            Some(class) => {
                let style = match class {
                    DoseClass::Heavy => Style::new().red(),
                    DoseClass::Strong => Style::new().yellow(),
                    _ => Style::new().green(),
                };
                format!("{} {}", self.paint(&class.gauge(), style), class)
            }
            None => self.dim("○○○○ unclassified"),
        }
    }
}

/// Parse a user-supplied time: RFC 3339, `YYYY-MM-DD HH:MM` or `HH:MM` today, in local time
pub fn parse_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(input) {
        return Ok(t.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            let today: NaiveDate = now.with_timezone(&Local).date_naive();
            chrono::NaiveTime::parse_from_str(input, "%H:%M").map(|t| today.and_time(t))
        })
        .with_context(|| {
            format!("Invalid time '{input}'. Use RFC 3339, 'YYYY-MM-DD HH:MM' or 'HH:MM'")
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("Time '{input}' does not exist in the local timezone"))
}

/// Format a timestamp in local time
#[must_use]
pub fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Format a dose with units, or `unknown dose`
#[must_use]
pub fn format_dose(dose: Option<f64>, units: &str) -> String {
    match dose {
        Some(d) => format!("{} {}", trim_float(d), units),
        None => "unknown dose".to_string(),
    }
}

/// Print a float without trailing zeros
#[must_use]
pub fn trim_float(value: f64) -> String {
    let s = format!("{value:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_rfc3339() {
        let now = Utc::now();
        let t = parse_time("2025-06-01T20:00:00Z", now).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap());
        assert_eq!(parse_time("now", now).unwrap(), now);
        assert!(parse_time("yesterday-ish", now).is_err());
    }

    #[test]
    fn test_trim_float() {
        assert_eq!(trim_float(100.0), "100");
        assert_eq!(trim_float(0.25), "0.25");
        assert_eq!(trim_float(1.5), "1.5");
    }
}
