// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Custom substance commands

use super::AppContext;
use crate::types::CustomSubstance;
use anyhow::Result;

/// Run custom command
pub fn run(
    ctx: &AppContext,
    action: &str,
    name: Option<String>,
    units: Option<String>,
    description: Option<String>,
) -> Result<()> {
    match action {
        "add" | "create" => {
            let name = name.ok_or_else(|| anyhow::anyhow!("Substance name is required"))?;
            let repo = ctx.repo()?;
            let mut journal = ctx.load_journal()?;
            journal.add_custom_substance(
                CustomSubstance {
                    name: name.trim().to_string(),
                    units: units.unwrap_or_else(|| "mg".to_string()),
                    description: description.unwrap_or_default(),
                },
                &repo,
            )?;
            ctx.save_journal(&journal)?;
            println!("Added custom substance: {}", name.trim());
        }

        "list" | "ls" => {
            let journal = ctx.load_journal()?;
            let custom = &journal.store.custom_substances;
            if ctx.json {
                return ctx.print_json(custom);
            }
            if custom.is_empty() {
                println!("No custom substances. Use 'psychonaut-journal custom add <name>' to add one.");
                return Ok(());
            }
            println!("Custom substances ({}):", custom.len());
            for c in custom {
                let description = if c.description.is_empty() {
                    String::new()
                } else {
                    format!("  {}", ctx.dim(&c.description))
                };
                println!("  {} [{}]{}", ctx.heading(&c.name), c.units, description);
            }
        }

        other => anyhow::bail!("Unknown action: {}. Valid: add, list", other),
    }
    Ok(())
}
