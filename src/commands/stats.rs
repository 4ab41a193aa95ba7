// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Stats command - per-substance usage over a period

use super::{format_time, trim_float, AppContext};
use crate::stats::{substance_stats, Window};
use anyhow::Result;
use chrono::Utc;

/// Show usage statistics, for the last `days` days or all time
pub fn run(ctx: &AppContext, days: Option<u32>) -> Result<()> {
    let journal = ctx.load_journal()?;
    let now = Utc::now();
    let window = days.map_or(Window::All, Window::Days);
    let stats = substance_stats(&journal, window, now);

    if ctx.json {
        return ctx.print_json(&stats);
    }

    let period = match days {
        Some(n) => format!("last {n} days"),
        None => "all time".to_string(),
    };
    if stats.is_empty() {
        println!("No ingestions ({period})");
        return Ok(());
    }

    println!("Substances ({period}):");
    for stat in &stats {
        let mut totals: Vec<String> = stat
            .totals
            .iter()
            .map(|t| format!("{} {}", trim_float(t.amount), t.units))
            .collect();
        if stat.unknown_doses > 0 {
            totals.push(format!("{} unknown", stat.unknown_doses));
        }
        let days_ago = (now - stat.last_used).num_days();
        println!(
            "  {:<20} {:>3}x in {:>3} experiences  {}",
            ctx.substance(&stat.substance, stat.color),
            stat.ingestion_count,
            stat.experience_count,
            totals.join(" + ")
        );
        println!(
            "  {}",
            ctx.dim(&format!("  last {} ({} days ago)", format_time(stat.last_used), days_ago))
        );
    }
    Ok(())
}
