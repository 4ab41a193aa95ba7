// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Benchmarks for interaction checks and timeline building.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use psychonaut_journal::dose::cumulative_doses;
use psychonaut_journal::interaction::InteractionGraph;
use psychonaut_journal::substance::SubstanceRepo;
use psychonaut_journal::timeline::ExperienceTimeline;
use psychonaut_journal::types::{AdministrationRoute, Ingestion};

fn make_ingestions(n: usize) -> Vec<Ingestion> {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
    let substances = ["MDMA", "Caffeine", "Alcohol", "Cannabis"];
    (0..n)
        .map(|i| {
            let substance = substances[i % substances.len()];
            let time = start + Duration::minutes(i64::try_from(i).unwrap() * 20);
            Ingestion {
                id: Ingestion::generate_id("exp:bench", substance, time, AdministrationRoute::Oral),
                experience_id: "exp:bench".into(),
                substance: substance.into(),
                time,
                route: AdministrationRoute::Oral,
                dose: Some(10.0 + i as f64),
                units: "mg".into(),
                is_estimate: false,
                estimated_dose_sd: None,
                purity: None,
                notes: String::new(),
                created_at: start,
            }
        })
        .collect()
}

fn bench_graph_build(c: &mut Criterion) {
    let repo = SubstanceRepo::bundled().unwrap();
    c.bench_function("interaction_graph_build", |bench| {
        bench.iter(|| black_box(InteractionGraph::build(&repo).unwrap()))
    });
}

fn bench_check(c: &mut Criterion) {
    let repo = SubstanceRepo::bundled().unwrap();
    let graph = InteractionGraph::build(&repo).unwrap();
    let names: Vec<String> = repo.substances().iter().map(|s| s.name.clone()).collect();

    c.bench_function("interaction_check_all", |bench| {
        bench.iter(|| black_box(graph.check(&names)))
    });
}

fn bench_timeline(c: &mut Criterion) {
    let repo = SubstanceRepo::bundled().unwrap();
    let ingestions = make_ingestions(24);
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();

    c.bench_function("experience_timeline_24", |bench| {
        bench.iter(|| black_box(ExperienceTimeline::build(&ingestions, &repo, 0.5, now)))
    });
    c.bench_function("cumulative_doses_24", |bench| {
        bench.iter(|| black_box(cumulative_doses(&ingestions, &repo)))
    });
}

criterion_group!(benches, bench_graph_build, bench_check, bench_timeline);
criterion_main!(benches);
