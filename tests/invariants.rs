// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for dose, timeline and interaction logic
//!
//! These tests verify critical invariants:
//! 1. Dose classification never decreases as the dose grows
//! 2. Cumulative doses add up to the logged doses
//! 3. Interaction lookups do not depend on argument order
//! 4. Timelines start at zero intensity and stay inside their height

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use psychonaut_journal::dose::{cumulative_doses, RoaDose};
use psychonaut_journal::interaction::InteractionGraph;
use psychonaut_journal::journal::{Journal, NewIngestion};
use psychonaut_journal::substance::SubstanceRepo;
use psychonaut_journal::timeline::{curve_value, ExperienceTimeline};
use psychonaut_journal::types::{AdministrationRoute, Ingestion};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

fn make_ingestion(substance: &str, dose: Option<f64>, minutes: i64) -> Ingestion {
    let start = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
    let time = start + Duration::minutes(minutes);
    Ingestion {
        id: Ingestion::generate_id("exp:test", substance, time, AdministrationRoute::Oral),
        experience_id: "exp:test".into(),
        substance: substance.into(),
        time,
        route: AdministrationRoute::Oral,
        dose,
        units: "mg".into(),
        is_estimate: false,
        estimated_dose_sd: None,
        purity: None,
        notes: String::new(),
        created_at: start,
    }
}

fn mdma_dose() -> RoaDose {
    RoaDose {
        units: "mg".into(),
        light_min: Some(40.0),
        common_min: Some(75.0),
        strong_min: Some(140.0),
        heavy_min: Some(180.0),
    }
}

const NAMES: [&str; 8] = [
    "MDMA", "Tramadol", "LSD", "Cocaine", "Caffeine", "Alcohol", "Ketamine", "Alprazolam",
];

// =============================================================================
// Invariant 1: Dose classification is monotonic
// =============================================================================

proptest! {
    #[test]
    fn prop_classification_monotonic(a in 0.0f64..400.0, b in 0.0f64..400.0) {
        let bands = mdma_dose();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (c_lo, c_hi) = (bands.classify(lo, "mg"), bands.classify(hi, "mg"));
        prop_assert!(c_lo.is_some() && c_hi.is_some());
        prop_assert!(c_lo <= c_hi);
    }

    #[test]
    fn prop_other_units_never_classify(dose in 0.0f64..400.0) {
        prop_assert_eq!(mdma_dose().classify(dose, "g"), None);
    }
}

// =============================================================================
// Invariant 2: Cumulative doses add up
// =============================================================================

proptest! {
    #[test]
    fn prop_cumulative_sum_matches(doses in prop::collection::vec(prop::option::of(1.0f64..200.0), 1..8)) {
        let repo = SubstanceRepo::bundled().unwrap();
        let ingestions: Vec<Ingestion> = doses
            .iter()
            .enumerate()
            .map(|(i, d)| make_ingestion("MDMA", *d, i64::try_from(i).unwrap() * 30))
            .collect();

        let totals = cumulative_doses(&ingestions, &repo);
        prop_assert_eq!(totals.len(), 1);
        let total = &totals[0];

        let known: f64 = doses.iter().flatten().sum();
        let unknown = doses.iter().filter(|d| d.is_none()).count();
        prop_assert!((total.known_dose - known).abs() < 1e-6);
        prop_assert_eq!(total.unknown_count, unknown);
        prop_assert_eq!(total.ingestion_count, doses.len());
        prop_assert_eq!(total.dose_class.is_some(), unknown == 0);
    }
}

// =============================================================================
// Invariant 3: Interaction lookups are order independent
// =============================================================================

proptest! {
    #[test]
    fn prop_between_symmetric(a in 0usize..NAMES.len(), b in 0usize..NAMES.len()) {
        let repo = SubstanceRepo::bundled().unwrap();
        let graph = InteractionGraph::build(&repo).unwrap();
        let ab = graph.between(NAMES[a], NAMES[b]).map(|i| i.kind);
        let ba = graph.between(NAMES[b], NAMES[a]).map(|i| i.kind);
        prop_assert_eq!(ab, ba);
        if a == b {
            prop_assert!(ab.is_none());
        }
    }

    #[test]
    fn prop_check_ignores_order(mut picks in prop::collection::vec(0usize..NAMES.len(), 2..6)) {
        let repo = SubstanceRepo::bundled().unwrap();
        let graph = InteractionGraph::build(&repo).unwrap();
        let forward: Vec<String> = picks.iter().map(|i| NAMES[*i].to_string()).collect();
        picks.reverse();
        let backward: Vec<String> = picks.iter().map(|i| NAMES[*i].to_string()).collect();

        let kinds = |names: &[String]| {
            let mut k: Vec<_> = graph.check(names).into_iter().map(|i| i.kind).collect();
            k.sort();
            k
        };
        prop_assert_eq!(kinds(&forward), kinds(&backward));
    }
}

// =============================================================================
// Invariant 4: Timeline shape
// =============================================================================

proptest! {
    #[test]
    fn prop_timeline_bounded(
        doses in prop::collection::vec(1.0f64..200.0, 1..5),
        weight in 0.0f64..=1.0,
    ) {
        let repo = SubstanceRepo::bundled().unwrap();
        let ingestions: Vec<Ingestion> = doses
            .iter()
            .enumerate()
            .map(|(i, d)| make_ingestion("MDMA", Some(*d), i64::try_from(i).unwrap() * 45))
            .collect();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();
        let timeline = ExperienceTimeline::build(&ingestions, &repo, weight, now).unwrap();

        for ing in &timeline.ingestions {
            prop_assert!(ing.height > 0.0 && ing.height <= 1.0 + 1e-9);
            prop_assert_eq!(ing.points[0].value, 0.0);
            prop_assert!(ing.points.iter().all(|p| p.value <= ing.height + 1e-9));
            prop_assert!(ing.points.windows(2).all(|w| w[0].t <= w[1].t));
        }

        let curve = &timeline.substances[0];
        let sum_of_heights: f64 = timeline.ingestions.iter().map(|i| i.height).sum();
        for p in &curve.points {
            prop_assert!(p.value <= sum_of_heights + 1e-9);
            let direct: f64 = timeline.ingestions.iter().map(|i| curve_value(&i.points, p.t)).sum();
            prop_assert!((direct - p.value).abs() < 1e-6);
        }
    }
}

// =============================================================================
// Journal invariants
// =============================================================================

#[test]
fn test_every_ingested_substance_has_a_companion() {
    let repo = SubstanceRepo::bundled().unwrap();
    let mut journal = Journal::new();
    let exp = journal.add_experience("Night", Utc::now());

    for (i, name) in NAMES.iter().enumerate() {
        let new = NewIngestion {
            substance: (*name).to_string(),
            time: Utc::now() + Duration::minutes(i64::try_from(i).unwrap()),
            route: AdministrationRoute::Oral,
            dose: None,
            units: "mg".into(),
            is_estimate: false,
            estimated_dose_sd: None,
            purity: None,
            notes: String::new(),
        };
        journal.add_ingestion(&exp, new, &repo, Utc::now()).unwrap();
    }

    for ingestion in &journal.store.ingestions {
        assert!(journal.color_of(&ingestion.substance).is_some());
    }
    let mut colors: Vec<_> = journal.store.companions.iter().map(|c| c.color).collect();
    let before = colors.len();
    colors.sort_by_key(|c| c.name());
    colors.dedup();
    assert_eq!(colors.len(), before, "colors are distinct while the palette lasts");
}

#[test]
fn test_save_is_deterministic() {
    let repo = SubstanceRepo::bundled().unwrap();
    let dir1 = TempDir::new().unwrap();
    let dir2 = TempDir::new().unwrap();
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap();

    for dir in [&dir1, &dir2] {
        let mut journal = Journal::new();
        let exp = journal.add_experience("Night", at);
        let new = NewIngestion {
            substance: "lsd".into(),
            time: at,
            route: AdministrationRoute::Sublingual,
            dose: Some(100.0),
            units: "µg".into(),
            is_estimate: true,
            estimated_dose_sd: Some(10.0),
            purity: Some(80.0),
            notes: String::new(),
        };
        journal.add_ingestion(&exp, new, &repo, at).unwrap();
        journal.save(dir.path()).unwrap();
    }

    let a = std::fs::read_to_string(dir1.path().join("journal.json")).unwrap();
    let b = std::fs::read_to_string(dir2.path().join("journal.json")).unwrap();
    assert_eq!(a, b);
}
