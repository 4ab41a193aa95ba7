// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Timeline command - phase table and intensity curves of an experience

use super::{format_time, AppContext};
use crate::journal::Journal;
use crate::timeline::{curve_value, format_secs, ExperienceTimeline, TimelineShape};
use anyhow::Result;
use chrono::Utc;

/// Columns of the intensity strip
const WIDTH: usize = 48;
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Show the timeline of an experience
pub fn run(ctx: &AppContext, experience: &str) -> Result<()> {
    let repo = ctx.repo()?;
    let journal = ctx.load_journal()?;
    let exp = journal.resolve_experience(experience)?;
    let ingestions = journal.ingestions_of(&exp.id);

    let Some(timeline) =
        ExperienceTimeline::build(&ingestions, &repo, ctx.config.timeline_weight, Utc::now())
    else {
        if ctx.json {
            return ctx.print_json(&serde_json::Value::Null);
        }
        println!("No ingestions in {}", exp.title);
        return Ok(());
    };

    if ctx.json {
        return ctx.print_json(&timeline);
    }

    println!("{}", ctx.heading(&exp.title));
    render(ctx, &timeline, &journal);
    Ok(())
}

/// Print the phase table and one intensity strip per substance
pub fn render(ctx: &AppContext, timeline: &ExperienceTimeline, journal: &Journal) {
    println!("Started {}", format_time(timeline.start));
    match timeline.end_secs {
        Some(end) => println!("Effects end after about {}", format_secs(end)),
        None => println!("End of effects unknown"),
    }
    if let Some(now) = timeline.now_secs {
        println!("Now: {} in", format_secs(now));
    }

    for ing in &timeline.ingestions {
        let name = ctx.substance(&ing.substance, journal.color_of(&ing.substance));
        let note = match ing.shape {
            TimelineShape::Full => String::new(),
            TimelineShape::Partial | TimelineShape::TotalOnly => ctx.dim(" (inferred from total)"),
            TimelineShape::Open => ctx.dim(" (end unknown)"),
            TimelineShape::Unknown => ctx.dim(" (no duration data)"),
        };
        println!();
        println!("  {} at +{}{}", name, format_secs(ing.start_secs), note);
        for span in &ing.phases {
            println!(
                "    {:<7} +{:>8} .. +{:>8}",
                span.phase.to_string(),
                format_secs(span.start),
                format_secs(span.end)
            );
        }
        if let Some((lo, hi)) = ing.end_range {
            println!("    {}", ctx.dim(&format!("ends between +{} and +{}", format_secs(lo), format_secs(hi))));
        }
    }

    let Some(span) = timeline.end_secs.filter(|e| *e > 0.0) else {
        return;
    };
    println!();
    for curve in &timeline.substances {
        if curve.points.is_empty() {
            continue;
        }
        let strip = strip(&curve.points, span);
        let marker = if curve.incomplete { ctx.dim(" +open") } else { String::new() };
        println!(
            "  {:<16} {}{}",
            curve.substance,
            ctx.substance(&strip, journal.color_of(&curve.substance)),
            marker
        );
    }
}

/// Sample a curve into a fixed-width bar strip
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn strip(points: &[crate::timeline::TimelinePoint], span: f64) -> String {
    let peak = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    (0..WIDTH)
        .map(|col| {
            let t = span * (col as f64 + 0.5) / WIDTH as f64;
            let value = curve_value(points, t);
            if value <= 0.0 || peak <= 0.0 {
                ' '
            } else {
                let level = ((value / peak) * (LEVELS.len() - 1) as f64).round() as usize;
                LEVELS[level.min(LEVELS.len() - 1)]
            }
        })
        .collect()
}
