// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Experience commands - create, list, show, edit and delete experiences

use super::{format_dose, format_time, trim_float, AppContext};
use crate::dose::{cumulative_doses, CumulativeDose, DoseClass};
use crate::interaction::Interaction;
use crate::timeline::ExperienceTimeline;
use crate::types::{Experience, Ingestion, ShulginRating};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

/// Options for `experience`
#[derive(Debug, Clone, Default)]
pub struct ExperienceArgs {
    /// Title, id or unique title prefix
    pub name: Option<String>,
    /// New title when editing
    pub title: Option<String>,
    /// Notes
    pub text: Option<String>,
    /// Shulgin rating symbol
    pub rating: Option<String>,
    /// Favorite flag
    pub favorite: Option<bool>,
}

#[derive(Serialize)]
struct IngestionReport<'a> {
    #[serde(flatten)]
    ingestion: &'a Ingestion,
    dose_class: Option<DoseClass>,
}

#[derive(Serialize)]
struct ExperienceReport<'a> {
    experience: &'a Experience,
    ingestions: Vec<IngestionReport<'a>>,
    cumulative: Vec<CumulativeDose>,
    interactions: Vec<Interaction>,
    timeline: Option<ExperienceTimeline>,
}

/// Run experience command
pub fn run(ctx: &AppContext, action: &str, args: ExperienceArgs) -> Result<()> {
    match action {
        "create" | "new" => create(ctx, args),
        "list" | "ls" => list(ctx),
        "show" => show(ctx, &required(args.name)?),
        "edit" => edit(ctx, args),
        "delete" | "rm" => delete(ctx, &required(args.name)?),
        other => anyhow::bail!("Unknown action: {}. Valid: create, list, show, edit, delete", other),
    }
}

fn required(name: Option<String>) -> Result<String> {
    name.ok_or_else(|| anyhow::anyhow!("Experience name is required"))
}

fn create(ctx: &AppContext, args: ExperienceArgs) -> Result<()> {
    let title = required(args.name)?;
    let mut journal = ctx.load_journal()?;
    let id = journal.add_experience(&title, Utc::now());
    {
        let exp = journal.edit_experience(&id)?;
        if let Some(text) = args.text {
            exp.text = text;
        }
        if let Some(rating) = &args.rating {
            exp.rating = Some(rating.parse::<ShulginRating>()?);
        }
        exp.is_favorite = args.favorite.unwrap_or(false);
    }
    ctx.save_journal(&journal)?;
    info!("Created experience {}", id);

    if ctx.json {
        return ctx.print_json(&serde_json::json!({ "id": id, "title": title }));
    }
    println!("Created experience: {} ({})", title, id);
    Ok(())
}

fn list(ctx: &AppContext) -> Result<()> {
    let journal = ctx.load_journal()?;
    let experiences = journal.experiences();

    if ctx.json {
        return ctx.print_json(&experiences);
    }
    if experiences.is_empty() {
        println!("No experiences yet. Use 'psychonaut-journal ingest <substance>' to log one.");
        return Ok(());
    }

    println!("Experiences ({}):", experiences.len());
    for exp in experiences {
        let ingestions = journal.ingestions_of(&exp.id);
        let mut substances: Vec<&str> = Vec::new();
        for ing in &ingestions {
            if !substances.contains(&ing.substance.as_str()) {
                substances.push(&ing.substance);
            }
        }
        let star = if exp.is_favorite { "★ " } else { "" };
        let rating = exp.rating.map(|r| format!(" [{}]", r.sign())).unwrap_or_default();
        println!(
            "  {} {}{}{}  {}",
            ctx.dim(&format_time(exp.sort_date)),
            star,
            ctx.heading(&exp.title),
            rating,
            ctx.dim(&substances.join(", "))
        );
    }
    Ok(())
}

fn show(ctx: &AppContext, name: &str) -> Result<()> {
    let repo = ctx.repo()?;
    let graph = ctx.interactions(&repo)?;
    let journal = ctx.load_journal()?;
    let exp = journal.resolve_experience(name)?;
    let ingestions = journal.ingestions_of(&exp.id);

    let cumulative = cumulative_doses(&ingestions, &repo);
    let names: Vec<String> = ingestions.iter().map(|i| i.substance.clone()).collect();
    let interactions = graph.check(&names);
    let timeline =
        ExperienceTimeline::build(&ingestions, &repo, ctx.config.timeline_weight, Utc::now());

    if ctx.json {
        let report = ExperienceReport {
            experience: exp,
            ingestions: ingestions
                .iter()
                .map(|i| IngestionReport { ingestion: i, dose_class: i.dose_class(&repo) })
                .collect(),
            cumulative,
            interactions,
            timeline,
        };
        return ctx.print_json(&report);
    }

    println!("{}", ctx.heading(&exp.title));
    println!("  id: {}", exp.id);
    if let Some(rating) = exp.rating {
        println!("  rating: {}", rating.sign());
    }
    if exp.is_favorite {
        println!("  favorite");
    }
    if !exp.text.is_empty() {
        println!("  notes: {}", exp.text);
    }

    println!();
    println!("Ingestions ({}):", ingestions.len());
    for ing in &ingestions {
        let estimate = if ing.is_estimate { "~" } else { "" };
        let purity = ing
            .purity
            .map(|p| format!(" at {}% purity", trim_float(p)))
            .unwrap_or_default();
        println!(
            "  {}  {} {}{} {}{}  {}",
            ctx.dim(&format_time(ing.time)),
            ctx.substance(&ing.substance, journal.color_of(&ing.substance)),
            estimate,
            format_dose(ing.dose, &ing.units),
            ing.route,
            purity,
            ctx.dose_class(ing.dose_class(&repo))
        );
        println!("    {}", ctx.dim(&ing.id));
        if !ing.notes.is_empty() {
            println!("    {}", ing.notes);
        }
    }

    let redosed: Vec<&CumulativeDose> = cumulative.iter().filter(|c| c.ingestion_count > 1).collect();
    if !redosed.is_empty() {
        println!();
        println!("Cumulative doses:");
        for total in redosed {
            let amount = match total.total() {
                Some(sum) => format!("{} {}", trim_float(sum), total.units),
                None => format!(
                    "{} {} + {} unknown",
                    trim_float(total.known_dose),
                    total.units,
                    total.unknown_count
                ),
            };
            let sd = total
                .standard_deviation
                .map(|sd| format!(" ±{}", trim_float(sd)))
                .unwrap_or_default();
            println!(
                "  {} {} {}{}  {}",
                ctx.substance(&total.substance, journal.color_of(&total.substance)),
                total.route,
                amount,
                sd,
                ctx.dose_class(total.dose_class)
            );
        }
    }

    if !interactions.is_empty() {
        println!();
        println!("Interactions:");
        for interaction in &interactions {
            super::interactions::print_interaction(ctx, interaction);
        }
    }

    if let Some(timeline) = &timeline {
        println!();
        println!("Timeline:");
        super::timeline::render(ctx, timeline, &journal);
    }
    Ok(())
}

fn edit(ctx: &AppContext, args: ExperienceArgs) -> Result<()> {
    let name = required(args.name)?;
    let mut journal = ctx.load_journal()?;
    let exp = journal.edit_experience(&name)?;

    if let Some(title) = args.title {
        exp.title = title;
    }
    if let Some(text) = args.text {
        exp.text = text;
    }
    if let Some(rating) = &args.rating {
        exp.rating = if rating.is_empty() || rating == "none" {
            None
        } else {
            Some(rating.parse::<ShulginRating>()?)
        };
    }
    if let Some(favorite) = args.favorite {
        exp.is_favorite = favorite;
    }
    let title = exp.title.clone();

    ctx.save_journal(&journal)?;
    println!("Updated experience: {}", title);
    Ok(())
}

fn delete(ctx: &AppContext, name: &str) -> Result<()> {
    let mut journal = ctx.load_journal()?;
    let title = journal.resolve_experience(name)?.title.clone();
    let removed = journal.delete_experience(name)?;
    ctx.save_journal(&journal)?;
    println!("Deleted experience: {} ({} ingestions)", title, removed);
    Ok(())
}
