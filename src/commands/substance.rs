// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Substance command - dose bands, durations, tolerance and interactions

use super::{trim_float, AppContext};
use crate::interaction::{InteractionEntry, InteractionType};
use crate::substance::Substance;
use crate::timeline::{format_secs, DurationRange, DEFAULT_WEIGHT};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct SubstanceReport<'a> {
    #[serde(flatten)]
    substance: &'a Substance,
    interaction_listing: &'a [InteractionEntry],
}

/// Show reference information for a substance
pub fn run(ctx: &AppContext, name: &str) -> Result<()> {
    let repo = ctx.repo()?;
    let journal = ctx.load_journal()?;

    let Some(substance) = repo.get(name) else {
        if let Some(custom) = journal.custom_substance(name) {
            if ctx.json {
                return ctx.print_json(custom);
            }
            println!("{} (custom, units: {})", ctx.heading(&custom.name), custom.units);
            if !custom.description.is_empty() {
                println!("  {}", custom.description);
            }
            return Ok(());
        }
        let hits = repo.search(name, &journal.store.custom_substances);
        let suggestions: Vec<&str> = hits.iter().take(5).map(|h| h.name.as_str()).collect();
        if suggestions.is_empty() {
            anyhow::bail!("Unknown substance: {}", name);
        }
        anyhow::bail!("Unknown substance: {}. Did you mean: {}?", name, suggestions.join(", "));
    };

    let graph = ctx.interactions(&repo)?;
    let listing = graph.listing(&substance.name).unwrap_or_default();

    if ctx.json {
        return ctx.print_json(&SubstanceReport { substance, interaction_listing: listing });
    }

    println!("{}", ctx.substance(&substance.name, journal.color_of(&substance.name)));
    if !substance.common_names.is_empty() {
        println!("  also: {}", substance.common_names.join(", "));
    }
    if !substance.categories.is_empty() {
        println!("  categories: {}", substance.categories.join(", "));
    }
    for (label, value) in [
        ("chemical class", &substance.chemical_class),
        ("psychoactive class", &substance.psychoactive_class),
        ("addiction potential", &substance.addiction_potential),
        ("url", &substance.url),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
    if let Some(summary) = &substance.summary {
        println!();
        println!("{summary}");
    }

    for roa in &substance.roas {
        println!();
        println!("{}", ctx.heading(&roa.route.to_string()));
        if let Some(dose) = &roa.dose {
            for (class, lo, hi) in dose.bands() {
                let range = match (lo, hi) {
                    (None, Some(hi)) => format!("< {} {}", trim_float(hi), dose.units),
                    (Some(lo), Some(hi)) => {
                        format!("{}-{} {}", trim_float(lo), trim_float(hi), dose.units)
                    }
                    (Some(lo), None) => format!("{}+ {}", trim_float(lo), dose.units),
                    (None, None) => continue,
                };
                println!("  {:<10} {}", class.to_string(), range);
            }
        }
        if let Some(duration) = &roa.duration {
            let phases: [(&str, Option<DurationRange>); 6] = [
                ("onset", duration.onset),
                ("comeup", duration.comeup),
                ("peak", duration.peak),
                ("offset", duration.offset),
                ("total", duration.total),
                ("afterglow", duration.afterglow),
            ];
            for (label, range) in phases {
                if let Some(range) = range {
                    let typical = range
                        .interpolate(DEFAULT_WEIGHT)
                        .map(|s| ctx.dim(&format!(" (~{})", format_secs(s))))
                        .unwrap_or_default();
                    println!("  {label:<10} {range}{typical}");
                }
            }
        }
        if let Some(bio) = roa.bioavailability {
            if let (Some(min), Some(max)) = (bio.min, bio.max) {
                println!("  {:<10} {}-{}%", "bioavail.", trim_float(min), trim_float(max));
            }
        }
    }

    if let Some(remarks) = &substance.dosage_remarks {
        println!();
        println!("{}", ctx.dim(remarks));
    }

    if let Some(tolerance) = &substance.tolerance {
        println!();
        println!("{}", ctx.heading("Tolerance"));
        for (label, value) in [("full", &tolerance.full), ("half", &tolerance.half), ("zero", &tolerance.zero)] {
            if let Some(value) = value {
                println!("  {label}: {value}");
            }
        }
        if !substance.cross_tolerances.is_empty() {
            println!("  cross: {}", substance.cross_tolerances.join(", "));
        }
    }

    if !listing.is_empty() {
        println!();
        println!("{}", ctx.heading("Interactions"));
        for kind in [InteractionType::Dangerous, InteractionType::Unsafe, InteractionType::Uncertain] {
            for entry in listing.iter().filter(|e| e.kind == kind) {
                let same_name = matches!(entry.resolved.as_slice(), [only] if only.eq_ignore_ascii_case(&entry.raw));
                let resolved = if entry.resolved.is_empty() || same_name {
                    String::new()
                } else {
                    ctx.dim(&format!(" ({})", entry.resolved.join(", ")))
                };
                println!("  {:<10} {}{}", ctx.severity(kind), entry.raw, resolved);
            }
        }
    }
    Ok(())
}
