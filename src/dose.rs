// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dose classification and cumulative doses

use crate::substance::SubstanceRepo;
use crate::types::{AdministrationRoute, Ingestion};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Reference dose bands for one route.
///
/// Each field is the lower bound of its band; a band ends where the next one
/// begins. Anything below `light_min` is a threshold dose.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoaDose {
    /// Dose units
    pub units: String,
    /// Start of the light band
    pub light_min: Option<f64>,
    /// Start of the common band
    pub common_min: Option<f64>,
    /// Start of the strong band
    pub strong_min: Option<f64>,
    /// Start of the heavy band
    pub heavy_min: Option<f64>,
}

/// Classified strength of a dose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseClass {
    /// Below the light band
    Threshold,
    /// Light
    Light,
    /// Common
    Common,
    /// Strong
    Strong,
    /// Heavy
    Heavy,
}

impl DoseClass {
    /// Number of filled dots used to display this class
    #[must_use]
    pub fn dots(&self) -> u8 {
        match self {
            Self::Threshold => 0,
            Self::Light => 1,
            Self::Common => 2,
            Self::Strong => 3,
            Self::Heavy => 4,
        }
    }

    /// Four-dot gauge, e.g. `●●○○`
    #[must_use]
    pub fn gauge(&self) -> String {
        let filled = usize::from(self.dots());
        format!("{}{}", "●".repeat(filled), "○".repeat(4 - filled))
    }
}

impl fmt::Display for DoseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Threshold => "threshold",
            Self::Light => "light",
            Self::Common => "common",
            Self::Strong => "strong",
            Self::Heavy => "heavy",
        };
        f.write_str(name)
    }
}

impl RoaDose {
    /// Classify a dose given in `units`.
    ///
    /// Returns `None` when the units differ from the reference units or when
    /// the bands needed to place the dose are missing.
    #[must_use]
    pub fn classify(&self, dose: f64, units: &str) -> Option<DoseClass> {
        if !units_match(&self.units, units) || !dose.is_finite() {
            return None;
        }

        let in_band = |lo: Option<f64>, hi: Option<f64>| match (lo, hi) {
            (Some(lo), Some(hi)) => lo <= dose && dose < hi,
            _ => false,
        };

        if self.light_min.is_some_and(|light| dose < light) {
            Some(DoseClass::Threshold)
        } else if in_band(self.light_min, self.common_min) {
            Some(DoseClass::Light)
        } else if in_band(self.common_min, self.strong_min) {
            Some(DoseClass::Common)
        } else if in_band(self.strong_min, self.heavy_min) {
            Some(DoseClass::Strong)
        } else if self.heavy_min.is_some_and(|heavy| dose >= heavy) {
            Some(DoseClass::Heavy)
        } else {
            None
        }
    }

    /// Midpoint of the common band
    #[must_use]
    pub fn average_common_dose(&self) -> Option<f64> {
        match (self.common_min, self.strong_min) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
            _ => None,
        }
    }

    /// Band bounds as `(class, lower, upper)` for display
    #[must_use]
    pub fn bands(&self) -> Vec<(DoseClass, Option<f64>, Option<f64>)> {
        vec![
            (DoseClass::Threshold, None, self.light_min),
            (DoseClass::Light, self.light_min, self.common_min),
            (DoseClass::Common, self.common_min, self.strong_min),
            (DoseClass::Strong, self.strong_min, self.heavy_min),
            (DoseClass::Heavy, self.heavy_min, None),
        ]
    }
}

/// Compare dose units loosely: case, surrounding space and the two spellings of micro
#[must_use]
pub fn units_match(a: &str, b: &str) -> bool {
    normalize_units(a) == normalize_units(b)
}

fn normalize_units(units: &str) -> String {
    units.trim().to_lowercase().replace(['µ', 'μ'], "u")
}

/// Ratio of a dose to the average common dose, e.g. 1.5 for one and a half times
#[must_use]
pub fn dose_relative_to_common(dose: f64, roa_dose: &RoaDose) -> Option<f64> {
    roa_dose
        .average_common_dose()
        .filter(|avg| *avg > 0.0)
        .map(|avg| dose / avg)
}

impl Ingestion {
    /// Dose of the active substance after purity adjustment
    #[must_use]
    pub fn pure_dose(&self) -> Option<f64> {
        let dose = self.dose?;
        Some(match self.purity {
            Some(purity) => dose * purity / 100.0,
            None => dose,
        })
    }

    /// Standard deviation scaled by purity like the dose itself
    #[must_use]
    pub fn pure_dose_sd(&self) -> Option<f64> {
        let sd = self.estimated_dose_sd?;
        Some(match self.purity {
            Some(purity) => sd * purity / 100.0,
            None => sd,
        })
    }

    /// Classify this ingestion against the reference data
    #[must_use]
    pub fn dose_class(&self, repo: &SubstanceRepo) -> Option<DoseClass> {
        let roa_dose = repo
            .get(&self.substance)?
            .roa(self.route)?
            .dose
            .as_ref()?;
        roa_dose.classify(self.pure_dose()?, &self.units)
    }
}

// =============================================================================
// Cumulative doses
// =============================================================================

/// Sum of all doses of one substance by one route in a set of ingestions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeDose {
    /// Substance name
    pub substance: String,
    /// Route of administration
    pub route: AdministrationRoute,
    /// Dose units
    pub units: String,
    /// Sum of known pure doses
    pub known_dose: f64,
    /// Ingestions whose dose was not recorded
    pub unknown_count: usize,
    /// Total ingestions in the group
    pub ingestion_count: usize,
    /// At least one dose is an estimate
    pub is_estimate: bool,
    /// Combined standard deviation of the estimates
    pub standard_deviation: Option<f64>,
    /// Class of the summed dose, only when every dose is known
    pub dose_class: Option<DoseClass>,
    /// First ingestion time of the group
    pub first_time: DateTime<Utc>,
}

impl CumulativeDose {
    /// The summed dose, `None` if any dose in the group is unknown
    #[must_use]
    pub fn total(&self) -> Option<f64> {
        (self.unknown_count == 0).then_some(self.known_dose)
    }
}

/// Sum doses per substance, route and units.
///
/// Groups are returned in the order their first ingestion was taken.
#[must_use]
pub fn cumulative_doses(ingestions: &[Ingestion], repo: &SubstanceRepo) -> Vec<CumulativeDose> {
    let mut groups: HashMap<(String, AdministrationRoute, String), CumulativeDose> = HashMap::new();
    let mut variances: HashMap<(String, AdministrationRoute, String), f64> = HashMap::new();

    for ingestion in ingestions {
        let canonical = repo
            .get(&ingestion.substance)
            .map_or_else(|| ingestion.substance.clone(), |s| s.name.clone());
        let key = (
            canonical.clone(),
            ingestion.route,
            normalize_units(&ingestion.units),
        );

        let entry = groups.entry(key.clone()).or_insert_with(|| CumulativeDose {
            substance: canonical,
            route: ingestion.route,
            units: ingestion.units.clone(),
            known_dose: 0.0,
            unknown_count: 0,
            ingestion_count: 0,
            is_estimate: false,
            standard_deviation: None,
            dose_class: None,
            first_time: ingestion.time,
        });

        entry.ingestion_count += 1;
        entry.is_estimate |= ingestion.is_estimate;
        entry.first_time = entry.first_time.min(ingestion.time);
        match ingestion.pure_dose() {
            Some(dose) => entry.known_dose += dose,
            None => entry.unknown_count += 1,
        }
        if let Some(sd) = ingestion.pure_dose_sd() {
            *variances.entry(key).or_default() += sd * sd;
        }
    }

    let mut result: Vec<CumulativeDose> = groups
        .into_iter()
        .map(|(key, mut cumulative)| {
            cumulative.standard_deviation = variances.get(&key).map(|v| v.sqrt());
            if let Some(total) = cumulative.total() {
                cumulative.dose_class = repo
                    .get(&cumulative.substance)
                    .and_then(|s| s.roa(cumulative.route))
                    .and_then(|roa| roa.dose.as_ref())
                    .and_then(|d| d.classify(total, &cumulative.units));
            }
            cumulative
        })
        .collect();

    result.sort_by(|a, b| {
        a.first_time
            .cmp(&b.first_time)
            .then_with(|| a.substance.cmp(&b.substance))
            .then(a.route.cmp(&b.route))
    });
    result
}
