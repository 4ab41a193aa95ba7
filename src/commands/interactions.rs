// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Interaction check across a set of substances

use super::AppContext;
use crate::interaction::{Interaction, MatchKind};
use anyhow::Result;

/// Check every pair of the given substances
pub fn run(ctx: &AppContext, names: &[String]) -> Result<()> {
    if names.len() < 2 {
        anyhow::bail!("Name at least two substances to check");
    }
    let repo = ctx.repo()?;
    let graph = ctx.interactions(&repo)?;

    let unknown: Vec<&String> = names.iter().filter(|n| repo.get(n).is_none()).collect();
    let found = graph.check(names);

    if ctx.json {
        return ctx.print_json(&serde_json::json!({
            "interactions": found,
            "unknown": unknown,
        }));
    }

    for name in &unknown {
        println!("{}", ctx.dim(&format!("{name}: not in the substance data, no interactions known")));
    }
    if found.is_empty() {
        println!("No known interactions.");
        return Ok(());
    }
    for interaction in &found {
        print_interaction(ctx, interaction);
    }
    Ok(())
}

/// One interaction line, e.g. `DANGEROUS  MDMA + Tramadol (listed as Opioids)`
pub fn print_interaction(ctx: &AppContext, interaction: &Interaction) {
    let reason = match interaction.via {
        MatchKind::Direct => String::new(),
        MatchKind::Wildcard | MatchKind::Category => {
            ctx.dim(&format!(" (listed as {})", interaction.raw))
        }
    };
    println!(
        "  {:<10} {} + {}{}",
        ctx.severity(interaction.kind),
        interaction.from,
        interaction.to,
        reason
    );
}
