// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export and import commands - move the journal between installations

use super::AppContext;
use crate::journal::Journal;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Whole journal, importable
    Json,
    /// One row per ingestion, for spreadsheets
    Csv,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Run the export command
pub fn run_export(ctx: &AppContext, format: &str, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting to {}", format);

    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {}. Supported: json, csv", format))?;
    let journal = ctx.load_journal()?;

    match output {
        Some(path) => {
            match export_format {
                ExportFormat::Json => journal.export(&path)?,
                ExportFormat::Csv => fs::write(&path, to_csv(&journal))
                    .with_context(|| format!("Failed to write to {}", path.display()))?,
            }
            println!(
                "Exported {} experiences and {} ingestions to {}",
                journal.store.experiences.len(),
                journal.store.ingestions.len(),
                path.display()
            );
        }
        None => {
            let content = match export_format {
                ExportFormat::Json => serde_json::to_string_pretty(&journal.store)
                    .context("Failed to serialize journal")?,
                ExportFormat::Csv => to_csv(&journal),
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Run the import command
pub fn run_import(ctx: &AppContext, path: &Path) -> Result<()> {
    let mut journal = ctx.load_journal()?;
    let summary = journal
        .import(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    ctx.save_journal(&journal)?;

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "experiences": summary.experiences,
            "ingestions": summary.ingestions,
            "companions": summary.companions,
            "custom_substances": summary.custom_substances,
        }));
    }
    println!(
        "Imported {} experiences, {} ingestions, {} colors, {} custom substances",
        summary.experiences, summary.ingestions, summary.companions, summary.custom_substances
    );
    Ok(())
}

fn to_csv(journal: &Journal) -> String {
    let mut out = String::from("experience,time,substance,route,dose,units,estimate,purity,notes\n");
    let mut ingestions: Vec<_> = journal.store.ingestions.iter().collect();
    ingestions.sort_by_key(|i| i.time);

    for ing in ingestions {
        let experience = journal
            .store
            .experiences
            .iter()
            .find(|e| e.id == ing.experience_id)
            .map_or("", |e| e.title.as_str());
        let row = [
            csv_field(experience),
            ing.time.to_rfc3339(),
            csv_field(&ing.substance),
            ing.route.to_string(),
            ing.dose.map(|d| d.to_string()).unwrap_or_default(),
            csv_field(&ing.units),
            ing.is_estimate.to_string(),
            ing.purity.map(|p| p.to_string()).unwrap_or_default(),
            csv_field(&ing.notes),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Quote a field when it contains separators or quotes
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
