// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Usage statistics over the journal

use crate::color::SubstanceColor;
use crate::dose::units_match;
use crate::journal::Journal;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Period the statistics cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The last `n` days up to now
    Days(u32),
    /// Everything in the journal
    All,
}

impl Window {
    fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Days(n) => Some(now - Duration::days(i64::from(n))),
            Self::All => None,
        }
    }
}

/// Known dose summed per units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoseTotal {
    /// Units as first logged
    pub units: String,
    /// Sum of pure doses
    pub amount: f64,
}

/// Usage of one substance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstanceStat {
    /// Substance name as logged
    pub substance: String,
    /// Number of ingestions
    pub ingestion_count: usize,
    /// Number of distinct experiences
    pub experience_count: usize,
    /// Most recent ingestion
    pub last_used: DateTime<Utc>,
    /// Companion color
    pub color: Option<SubstanceColor>,
    /// Summed known doses, one entry per units
    pub totals: Vec<DoseTotal>,
    /// Ingestions without a dose
    pub unknown_doses: usize,
}

/// Per-substance statistics for the window, most recently used first
#[must_use]
pub fn substance_stats(journal: &Journal, window: Window, now: DateTime<Utc>) -> Vec<SubstanceStat> {
    let since = window.since(now);
    let mut by_substance: BTreeMap<String, (SubstanceStat, HashSet<&str>)> = BTreeMap::new();

    for ingestion in &journal.store.ingestions {
        if since.is_some_and(|s| ingestion.time < s) || ingestion.time > now {
            continue;
        }
        let key = ingestion.substance.to_lowercase();
        let (stat, experiences) = by_substance.entry(key).or_insert_with(|| {
            (
                SubstanceStat {
                    substance: ingestion.substance.clone(),
                    ingestion_count: 0,
                    experience_count: 0,
                    last_used: ingestion.time,
                    color: journal.color_of(&ingestion.substance),
                    totals: Vec::new(),
                    unknown_doses: 0,
                },
                HashSet::new(),
            )
        });

        stat.ingestion_count += 1;
        experiences.insert(&ingestion.experience_id);
        stat.last_used = stat.last_used.max(ingestion.time);

        match ingestion.pure_dose() {
            Some(dose) => {
                match stat.totals.iter_mut().find(|t| units_match(&t.units, &ingestion.units)) {
                    Some(total) => total.amount += dose,
                    None => stat.totals.push(DoseTotal {
                        units: ingestion.units.clone(),
                        amount: dose,
                    }),
                }
            }
            None => stat.unknown_doses += 1,
        }
    }

    let mut stats: Vec<SubstanceStat> = by_substance
        .into_values()
        .map(|(mut stat, experiences)| {
            stat.experience_count = experiences.len();
            stat
        })
        .collect();
    stats.sort_by(|a, b| {
        b.last_used
            .cmp(&a.last_used)
            .then_with(|| a.substance.cmp(&b.substance))
    });
    stats
}

/// Whole days since a substance was last taken, `None` if never
#[must_use]
pub fn days_since_last_use(journal: &Journal, substance: &str, now: DateTime<Utc>) -> Option<i64> {
    journal
        .store
        .ingestions
        .iter()
        .filter(|i| i.substance.eq_ignore_ascii_case(substance) && i.time <= now)
        .map(|i| i.time)
        .max()
        .map(|last| (now - last).num_days())
}

/// Distinct substances taken between `since` and `until` inclusive, in order of first use
#[must_use]
pub fn recent_substances(
    journal: &Journal,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    journal
        .ingestions_since(since)
        .into_iter()
        .filter(|i| i.time <= until)
        .filter(|i| seen.insert(i.substance.to_lowercase()))
        .map(|i| i.substance.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::NewIngestion;
    use crate::substance::SubstanceRepo;
    use crate::types::AdministrationRoute;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 20, 0, 0).unwrap()
    }

    fn make_test_journal() -> Journal {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let log = |journal: &mut Journal, exp: &str, substance: &str, dose: Option<f64>, d: u32| {
            let new = NewIngestion {
                substance: substance.into(),
                time: day(d),
                route: AdministrationRoute::Oral,
                dose,
                units: "mg".into(),
                is_estimate: false,
                estimated_dose_sd: None,
                purity: None,
                notes: String::new(),
            };
            journal.add_ingestion(exp, new, &repo, day(d)).unwrap();
        };

        let first = journal.add_experience("First", day(1));
        log(&mut journal, &first, "MDMA", Some(100.0), 1);
        log(&mut journal, &first, "Caffeine", Some(80.0), 1);
        let second = journal.add_experience("Second", day(10));
        log(&mut journal, &second, "MDMA", None, 10);
        log(&mut journal, &second, "Caffeine", Some(120.0), 12);
        journal
    }

    #[test]
    fn test_all_time_stats() {
        let journal = make_test_journal();
        let stats = substance_stats(&journal, Window::All, day(20));

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].substance, "Caffeine");
        assert_eq!(stats[0].ingestion_count, 2);
        assert_eq!(stats[0].experience_count, 2);
        assert!((stats[0].totals[0].amount - 200.0).abs() < 1e-9);

        assert_eq!(stats[1].substance, "MDMA");
        assert_eq!(stats[1].unknown_doses, 1);
        assert!((stats[1].totals[0].amount - 100.0).abs() < 1e-9);
        assert_eq!(stats[1].color, journal.color_of("MDMA"));
    }

    #[test]
    fn test_windowed_stats() {
        let journal = make_test_journal();
        let stats = substance_stats(&journal, Window::Days(5), day(13));
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.ingestion_count == 1));

        let stats = substance_stats(&journal, Window::Days(2), day(13));
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].substance, "Caffeine");
    }

    #[test]
    fn test_days_since_last_use() {
        let journal = make_test_journal();
        assert_eq!(days_since_last_use(&journal, "mdma", day(17)), Some(7));
        assert_eq!(days_since_last_use(&journal, "LSD", day(17)), None);
    }

    #[test]
    fn test_recent_substances() {
        let journal = make_test_journal();
        assert_eq!(recent_substances(&journal, day(10), day(20)), vec!["MDMA", "Caffeine"]);
        assert!(recent_substances(&journal, day(13), day(20)).is_empty());
    }

    #[test]
    fn test_recent_substances_ignores_later_ingestions() {
        let journal = make_test_journal();
        // a dose backdated to day 11 only looks back, the caffeine on day 12 is later
        assert_eq!(recent_substances(&journal, day(9), day(11)), vec!["MDMA"]);
        assert_eq!(recent_substances(&journal, day(10), day(12)), vec!["MDMA", "Caffeine"]);
    }
}
