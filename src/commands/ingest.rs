// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Ingest command - log an ingestion and warn about interactions

use super::{format_dose, format_time, parse_time, trim_float, AppContext};
use crate::dose::dose_relative_to_common;
use crate::interaction::Interaction;
use crate::journal::{Journal, NewIngestion};
use crate::stats;
use crate::types::AdministrationRoute;
use anyhow::Result;
use chrono::{Duration, Local, Utc};
use serde_json::json;
use tracing::{debug, info};

/// Options for `ingest`
#[derive(Debug, Clone)]
pub struct IngestArgs {
    /// Substance name
    pub substance: String,
    /// Dose amount
    pub dose: Option<f64>,
    /// Dose units
    pub units: Option<String>,
    /// Route of administration
    pub route: AdministrationRoute,
    /// When it was taken, now if unset
    pub time: Option<String>,
    /// Experience to add to
    pub experience: Option<String>,
    /// Dose is an estimate
    pub estimate: bool,
    /// Standard deviation of the estimate
    pub sd: Option<f64>,
    /// Purity percent
    pub purity: Option<f64>,
    /// Notes
    pub note: Option<String>,
}

/// Log an ingestion
pub fn run(ctx: &AppContext, args: IngestArgs) -> Result<()> {
    let now = Utc::now();
    let repo = ctx.repo()?;
    let graph = ctx.interactions(&repo)?;
    let mut journal = ctx.load_journal()?;

    let time = match &args.time {
        Some(t) => parse_time(t, now)?,
        None => now,
    };

    let reference = repo.get(&args.substance);
    let units = args
        .units
        .clone()
        .or_else(|| {
            reference
                .and_then(|s| s.roa(args.route))
                .and_then(|r| r.dose.as_ref())
                .map(|d| d.units.clone())
        })
        .or_else(|| journal.custom_substance(&args.substance).map(|c| c.units.clone()))
        .unwrap_or_else(|| "mg".to_string());

    if reference.is_none() && journal.custom_substance(&args.substance).is_none() {
        debug!("{} is not in the substance data", args.substance);
    }

    let experience_id = match &args.experience {
        Some(query) => journal.resolve_experience(query)?.id.clone(),
        None => experience_for_day(&mut journal, time),
    };

    // Look back from the new ingestion before it is part of the journal
    let window = Duration::hours(i64::from(ctx.config.interaction_window_hours));
    let recent: Vec<String> = stats::recent_substances(&journal, time - window, time)
        .into_iter()
        .filter(|name| {
            let same = match (repo.get(name), reference) {
                (Some(a), Some(b)) => a.name == b.name,
                _ => name.eq_ignore_ascii_case(args.substance.trim()),
            };
            !same
        })
        .collect();

    let id = journal.add_ingestion(
        &experience_id,
        NewIngestion {
            substance: args.substance.clone(),
            time,
            route: args.route,
            dose: args.dose,
            units: units.clone(),
            is_estimate: args.estimate,
            estimated_dose_sd: args.sd,
            purity: args.purity,
            notes: args.note.clone().unwrap_or_default(),
        },
        &repo,
        now,
    )?;
    ctx.save_journal(&journal)?;
    info!("Logged ingestion {} in {}", id, experience_id);

    let Some(ingestion) = journal.store.ingestions.iter().find(|i| i.id == id) else {
        anyhow::bail!("Ingestion {} missing after save", id);
    };
    let class = ingestion.dose_class(&repo);
    let warnings: Vec<Interaction> = recent
        .iter()
        .filter_map(|other| graph.between(&ingestion.substance, other))
        .collect();

    if ctx.json {
        return ctx.print_json(&json!({
            "id": id,
            "experience_id": experience_id,
            "substance": ingestion.substance,
            "dose_class": class,
            "interactions": warnings,
        }));
    }

    println!(
        "Logged {} {} {} at {}",
        ctx.substance(&ingestion.substance, journal.color_of(&ingestion.substance)),
        format_dose(ingestion.dose, &ingestion.units),
        ingestion.route,
        format_time(ingestion.time)
    );
    if let Some(exp) = journal.store.experiences.iter().find(|e| e.id == experience_id) {
        println!("  experience: {}", exp.title);
    }
    println!("  id: {}", id);

    if ingestion.dose.is_some() {
        println!("  dose: {}", ctx.dose_class(class));
        let roa_dose = reference
            .and_then(|s| s.roa(ingestion.route))
            .and_then(|r| r.dose.as_ref());
        let ratio = roa_dose.zip(ingestion.pure_dose()).and_then(|(rd, dose)| {
            crate::dose::units_match(&rd.units, &ingestion.units)
                .then(|| dose_relative_to_common(dose, rd))
                .flatten()
        });
        if let Some(ratio) = ratio {
            println!("  {}", ctx.dim(&format!("{}x an average common dose", trim_float(ratio))));
        }
    }
    if reference.is_none() {
        println!("  {}", ctx.dim("not in the substance data: no dose bands, durations or interactions"));
    }

    if !warnings.is_empty() {
        println!();
        println!(
            "Taken within the last {} hours:",
            ctx.config.interaction_window_hours
        );
        for interaction in &warnings {
            super::interactions::print_interaction(ctx, interaction);
        }
    }
    Ok(())
}

/// The experience titled after the local date of `time`, created if missing
fn experience_for_day(journal: &mut Journal, time: chrono::DateTime<Utc>) -> String {
    let title = time.with_timezone(&Local).format("%Y-%m-%d").to_string();
    if let Some(exp) = journal.store.experiences.iter().find(|e| e.title == title) {
        return exp.id.clone();
    }
    journal.add_experience(&title, time)
}
