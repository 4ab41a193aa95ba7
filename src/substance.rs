// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Substance reference dataset
//!
//! The dataset is a PsychonautWiki-shaped JSON document. It is parsed once into
//! [`SubstanceRepo`], which every other module reads from. A small curated
//! dataset is compiled into the binary; a full export can be loaded from disk.

use crate::dose::RoaDose;
use crate::error::JournalResult;
use crate::timeline::{DurationRange, RoaDuration};
use crate::types::{AdministrationRoute, CustomSubstance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Dataset bundled with the binary
const BUNDLED_DATASET: &str = include_str!("../data/substances.json");

// =============================================================================
// Reference types
// =============================================================================

/// Bioavailability range in percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bioavailability {
    /// Lower bound
    pub min: Option<f64>,
    /// Upper bound
    pub max: Option<f64>,
}

/// Dose, duration and bioavailability for one route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roa {
    /// Route of administration
    pub route: AdministrationRoute,
    /// Dose bands
    pub dose: Option<RoaDose>,
    /// Duration ranges
    pub duration: Option<RoaDuration>,
    /// Bioavailability
    pub bioavailability: Option<Bioavailability>,
}

/// Raw interaction names as listed by a substance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Interactions {
    /// Dangerous combinations
    #[serde(default)]
    pub dangerous: Vec<String>,
    /// Unsafe combinations
    #[serde(default, rename = "unsafe")]
    pub unsafe_: Vec<String>,
    /// Combinations with uncertain safety
    #[serde(default)]
    pub uncertain: Vec<String>,
}

/// How long tolerance takes to fade
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tolerance {
    /// Time to full tolerance
    pub full: Option<String>,
    /// Time to half tolerance
    pub half: Option<String>,
    /// Time to baseline
    pub zero: Option<String>,
}

/// A reference substance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Substance {
    /// Canonical name
    pub name: String,
    /// Alternative names
    pub common_names: Vec<String>,
    /// Wiki URL
    pub url: Option<String>,
    /// Categories (psychedelic, stimulant ...)
    pub categories: Vec<String>,
    /// Chemical class
    pub chemical_class: Option<String>,
    /// Psychoactive class
    pub psychoactive_class: Option<String>,
    /// Short summary
    pub summary: Option<String>,
    /// Remarks about dosing
    pub dosage_remarks: Option<String>,
    /// Tolerance timings
    pub tolerance: Option<Tolerance>,
    /// Substances or classes sharing tolerance
    pub cross_tolerances: Vec<String>,
    /// Addiction potential description
    pub addiction_potential: Option<String>,
    /// Raw interaction lists
    pub interactions: Interactions,
    /// Per-route data
    pub roas: Vec<Roa>,
}

impl Substance {
    /// Data for a route, if the dataset has any
    #[must_use]
    pub fn roa(&self, route: AdministrationRoute) -> Option<&Roa> {
        self.roas.iter().find(|r| r.route == route)
    }

    /// Routes with reference data
    #[must_use]
    pub fn routes(&self) -> Vec<AdministrationRoute> {
        self.roas.iter().map(|r| r.route).collect()
    }

    /// Whether `name` is this substance's name or one of its common names
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.common_names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// Dataset format
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawDataset {
    substances: Vec<RawSubstance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubstance {
    name: String,
    #[serde(default)]
    common_names: Vec<String>,
    url: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    chemical_class: Option<String>,
    psychoactive_class: Option<String>,
    summary: Option<String>,
    dosage_remarks: Option<String>,
    tolerance: Option<Tolerance>,
    #[serde(default)]
    cross_tolerances: Vec<String>,
    addiction_potential: Option<String>,
    #[serde(default)]
    interactions: Interactions,
    #[serde(default)]
    roas: Vec<RawRoa>,
}

#[derive(Debug, Deserialize)]
struct RawRoa {
    name: String,
    dose: Option<RawDose>,
    duration: Option<RawDuration>,
    bioavailability: Option<Bioavailability>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawRange {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDose {
    units: Option<String>,
    threshold: Option<f64>,
    light: Option<RawRange>,
    common: Option<RawRange>,
    strong: Option<RawRange>,
    heavy: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDuration {
    onset: Option<DurationRange>,
    comeup: Option<DurationRange>,
    peak: Option<DurationRange>,
    offset: Option<DurationRange>,
    total: Option<DurationRange>,
    afterglow: Option<DurationRange>,
}

impl RawDose {
    /// Collapse threshold/light/common/strong/heavy into band minimums.
    ///
    /// Each band starts where the previous one ends when its own minimum is
    /// missing from the wiki data.
    fn into_roa_dose(self) -> RoaDose {
        let light = self.light;
        let common = self.common;
        let strong = self.strong;
        RoaDose {
            units: self.units.unwrap_or_default(),
            light_min: light.and_then(|r| r.min).or(self.threshold),
            common_min: common.and_then(|r| r.min).or(light.and_then(|r| r.max)),
            strong_min: strong.and_then(|r| r.min).or(common.and_then(|r| r.max)),
            heavy_min: self.heavy.or(strong.and_then(|r| r.max)),
        }
    }
}

impl RawDuration {
    fn into_roa_duration(self) -> RoaDuration {
        RoaDuration {
            onset: self.onset,
            comeup: self.comeup,
            peak: self.peak,
            offset: self.offset,
            total: self.total,
            afterglow: self.afterglow,
        }
    }
}

impl RawSubstance {
    fn into_substance(self) -> Substance {
        let mut roas = Vec::with_capacity(self.roas.len());
        for raw in self.roas {
            let Ok(route) = raw.name.parse::<AdministrationRoute>() else {
                debug!("Skipping unknown route '{}' for {}", raw.name, self.name);
                continue;
            };
            roas.push(Roa {
                route,
                dose: raw.dose.map(RawDose::into_roa_dose),
                duration: raw.duration.map(RawDuration::into_roa_duration),
                bioavailability: raw.bioavailability,
            });
        }

        Substance {
            name: self.name,
            common_names: self.common_names,
            url: self.url,
            categories: self.categories,
            chemical_class: self.chemical_class,
            psychoactive_class: self.psychoactive_class,
            summary: self.summary,
            dosage_remarks: self.dosage_remarks,
            tolerance: self.tolerance,
            cross_tolerances: self.cross_tolerances,
            addiction_potential: self.addiction_potential,
            interactions: self.interactions,
            roas,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Where a search hit came from and how well it matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Substance name
    pub name: String,
    /// 0 exact, 1 prefix, 2 contains, 3 category
    pub rank: u8,
    /// Hit is a user-defined substance
    pub is_custom: bool,
    /// Categories of the substance
    pub categories: Vec<String>,
}

/// The in-memory reference dataset
#[derive(Debug, Clone, Default)]
pub struct SubstanceRepo {
    substances: Vec<Substance>,
    /// Lowercase name or common name to index in `substances`
    index: HashMap<String, usize>,
}

impl SubstanceRepo {
    /// Parse the dataset compiled into the binary
    pub fn bundled() -> JournalResult<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    /// Parse a dataset file
    pub fn from_path(path: &Path) -> JournalResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a dataset document
    pub fn from_json(json: &str) -> JournalResult<Self> {
        let raw: RawDataset = serde_json::from_str(json)?;
        let substances: Vec<Substance> = raw
            .substances
            .into_iter()
            .map(RawSubstance::into_substance)
            .collect();
        debug!("Loaded {} substances", substances.len());
        Ok(Self::from_substances(substances))
    }

    /// Build a repository from already parsed substances
    #[must_use]
    pub fn from_substances(substances: Vec<Substance>) -> Self {
        let mut index = HashMap::new();
        // Common names first so a canonical name always wins a collision
        for (i, s) in substances.iter().enumerate() {
            for common in &s.common_names {
                index.entry(common.to_lowercase()).or_insert(i);
            }
        }
        for (i, s) in substances.iter().enumerate() {
            index.insert(s.name.to_lowercase(), i);
        }
        Self { substances, index }
    }

    /// Look up by name or common name, ignoring case
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Substance> {
        self.index
            .get(&name.trim().to_lowercase())
            .map(|&i| &self.substances[i])
    }

    /// All substances in dataset order
    #[must_use]
    pub fn substances(&self) -> &[Substance] {
        &self.substances
    }

    /// Number of substances
    #[must_use]
    pub fn len(&self) -> usize {
        self.substances.len()
    }

    /// Whether the dataset is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }

    /// Search names, common names and categories.
    ///
    /// Hits are ordered by rank, dataset before custom substances within a
    /// rank, then alphabetically.
    #[must_use]
    pub fn search(&self, query: &str, custom: &[CustomSubstance]) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .substances
            .iter()
            .filter_map(|s| {
                let rank = rank_match(&needle, &s.name, &s.common_names, &s.categories)?;
                Some(SearchHit {
                    name: s.name.clone(),
                    rank,
                    is_custom: false,
                    categories: s.categories.clone(),
                })
            })
            .collect();

        hits.extend(custom.iter().filter_map(|c| {
            let rank = rank_match(&needle, &c.name, &[], &[])?;
            Some(SearchHit {
                name: c.name.clone(),
                rank,
                is_custom: true,
                categories: Vec::new(),
            })
        }));

        hits.sort_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then(a.is_custom.cmp(&b.is_custom))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        hits
    }
}

fn rank_match(needle: &str, name: &str, common: &[String], categories: &[String]) -> Option<u8> {
    let name = name.to_lowercase();
    let common: Vec<String> = common.iter().map(|c| c.to_lowercase()).collect();

    if name == needle || common.iter().any(|c| c == needle) {
        Some(0)
    } else if name.starts_with(needle) {
        Some(1)
    } else if name.contains(needle) || common.iter().any(|c| c.contains(needle)) {
        Some(2)
    } else if categories.iter().any(|c| c.to_lowercase() == needle) {
        Some(3)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> SubstanceRepo {
        SubstanceRepo::bundled().expect("bundled dataset parses")
    }

    #[test]
    fn test_bundled_dataset_loads() {
        let repo = repo();
        assert!(!repo.is_empty());
        assert!(repo.get("LSD").is_some());
    }

    #[test]
    fn test_lookup_by_common_name() {
        let repo = repo();
        let molly = repo.get("molly").expect("common name lookup");
        assert_eq!(molly.name, "MDMA");
        assert_eq!(repo.get("  mdma ").map(|s| s.name.as_str()), Some("MDMA"));
    }

    #[test]
    fn test_dose_bands_fall_back_to_neighbours() {
        let json = r#"{"substances":[{"name":"Test","roas":[{"name":"oral","dose":{
            "units":"mg","threshold":5,"light":{"max":10},"common":{"min":10,"max":20},
            "strong":{"min":null,"max":40}}}]}]}"#;
        let repo = SubstanceRepo::from_json(json).unwrap();
        let dose = repo
            .get("test")
            .and_then(|s| s.roa(AdministrationRoute::Oral))
            .and_then(|r| r.dose.clone())
            .unwrap();
        assert_eq!(dose.light_min, Some(5.0));
        assert_eq!(dose.common_min, Some(10.0));
        assert_eq!(dose.strong_min, Some(20.0));
        assert_eq!(dose.heavy_min, Some(40.0));
    }

    #[test]
    fn test_unknown_route_is_skipped() {
        let json = r#"{"substances":[{"name":"Test","roas":[{"name":"telepathic"},{"name":"oral"}]}]}"#;
        let repo = SubstanceRepo::from_json(json).unwrap();
        assert_eq!(repo.get("Test").unwrap().routes(), vec![AdministrationRoute::Oral]);
    }

    #[test]
    fn test_search_ranking() {
        let repo = repo();
        let custom = vec![CustomSubstance {
            name: "Mystery Pill".into(),
            units: "mg".into(),
            description: String::new(),
        }];

        let hits = repo.search("lsd", &custom);
        assert_eq!(hits[0].name, "LSD");
        assert_eq!(hits[0].rank, 0);

        let hits = repo.search("stimulant", &custom);
        assert!(hits.iter().all(|h| h.rank == 3));
        assert!(hits.iter().any(|h| h.name == "Cocaine"));

        let hits = repo.search("myst", &custom);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].is_custom);

        assert!(repo.search("   ", &custom).is_empty());
    }

    #[test]
    fn test_malformed_dataset_is_an_error() {
        assert!(SubstanceRepo::from_json("{\"substances\": 3}").is_err());
    }
}
