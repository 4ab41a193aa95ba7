// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Color commands - companion colors per substance

use super::AppContext;
use crate::color::SubstanceColor;
use anyhow::Result;

/// Run color command
pub fn run(
    ctx: &AppContext,
    action: &str,
    substance: Option<String>,
    color: Option<String>,
) -> Result<()> {
    match action {
        "list" | "ls" => {
            let journal = ctx.load_journal()?;
            if ctx.json {
                return ctx.print_json(&journal.store.companions);
            }
            if journal.store.companions.is_empty() {
                println!("No substances logged yet. Palette:");
                for color in SubstanceColor::PALETTE {
                    println!("  {}", ctx.substance(color.name(), Some(color)));
                }
                return Ok(());
            }
            for companion in &journal.store.companions {
                println!(
                    "  {:<20} {} {}",
                    ctx.substance(&companion.substance, Some(companion.color)),
                    companion.color.name(),
                    ctx.dim(&companion.color.hex())
                );
            }
        }

        "set" => {
            let substance =
                substance.ok_or_else(|| anyhow::anyhow!("Substance name is required"))?;
            let color: SubstanceColor = color
                .ok_or_else(|| anyhow::anyhow!("Color is required"))?
                .parse()?;
            let repo = ctx.repo()?;
            let name = repo.get(&substance).map_or(substance, |s| s.name.clone());

            let mut journal = ctx.load_journal()?;
            journal.set_color(&name, color);
            ctx.save_journal(&journal)?;
            println!("{} is now {}", ctx.substance(&name, Some(color)), color.name());
        }

        other => anyhow::bail!("Unknown action: {}. Valid: list, set", other),
    }
    Ok(())
}
