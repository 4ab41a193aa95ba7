// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Psychonaut journal library - dose, timeline and interaction logic
//!
//! This crate provides the core functionality behind the journal: loading the
//! substance reference dataset, classifying logged doses, summing doses across
//! an experience, building duration timelines and resolving interactions.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod color;
pub mod commands;
pub mod config;
pub mod dose;
pub mod error;
pub mod interaction;
pub mod journal;
pub mod stats;
pub mod substance;
pub mod timeline;

/// Journal data types persisted in the data directory
pub mod types {
    use crate::color::SubstanceColor;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};
    use std::fmt;
    use std::str::FromStr;

    // =========================================================================
    // Administration Routes
    // =========================================================================

    /// Route of administration
    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        clap::ValueEnum,
    )]
    #[serde(rename_all = "lowercase")]
    pub enum AdministrationRoute {
        /// Swallowed
        Oral,
        /// Held under the tongue
        Sublingual,
        /// Held between gum and cheek
        Buccal,
        /// Snorted
        Insufflated,
        /// Rectal
        Rectal,
        /// Through the skin
        Transdermal,
        /// Injected under the skin
        Subcutaneous,
        /// Injected into muscle
        Intramuscular,
        /// Injected into a vein
        Intravenous,
        /// Smoked
        Smoked,
        /// Vaporized or inhaled
        Inhaled,
    }

    impl AdministrationRoute {
        /// All routes in display order
        pub const ALL: [Self; 11] = [
            Self::Oral,
            Self::Sublingual,
            Self::Buccal,
            Self::Insufflated,
            Self::Rectal,
            Self::Transdermal,
            Self::Subcutaneous,
            Self::Intramuscular,
            Self::Intravenous,
            Self::Smoked,
            Self::Inhaled,
        ];

        /// Lowercase name as used in the dataset
        #[must_use]
        pub fn name(&self) -> &'static str {
            match self {
                Self::Oral => "oral",
                Self::Sublingual => "sublingual",
                Self::Buccal => "buccal",
                Self::Insufflated => "insufflated",
                Self::Rectal => "rectal",
                Self::Transdermal => "transdermal",
                Self::Subcutaneous => "subcutaneous",
                Self::Intramuscular => "intramuscular",
                Self::Intravenous => "intravenous",
                Self::Smoked => "smoked",
                Self::Inhaled => "inhaled",
            }
        }

        /// Whether this route needs a needle
        #[must_use]
        pub fn is_injected(&self) -> bool {
            matches!(
                self,
                Self::Subcutaneous | Self::Intramuscular | Self::Intravenous
            )
        }
    }

    impl fmt::Display for AdministrationRoute {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }

    impl FromStr for AdministrationRoute {
        type Err = crate::error::JournalError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let needle = s.trim().to_lowercase();
            Self::ALL
                .into_iter()
                .find(|r| r.name() == needle)
                .ok_or_else(|| crate::error::JournalError::UnknownRoute(s.to_string()))
        }
    }

    // =========================================================================
    // Experience
    // =========================================================================

    /// Shulgin rating scale for an experience
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum ShulginRating {
        /// `-` no effect
        #[serde(rename = "-")]
        Minus,
        /// `+-` threshold
        #[serde(rename = "+-")]
        PlusMinus,
        /// `+` noticeable
        #[serde(rename = "+")]
        Plus,
        /// `++` clearly active
        #[serde(rename = "++")]
        TwoPlus,
        /// `+++` fully engaged
        #[serde(rename = "+++")]
        ThreePlus,
        /// `++++` peak experience
        #[serde(rename = "++++")]
        FourPlus,
    }

    impl ShulginRating {
        /// Symbol used for display and parsing
        #[must_use]
        pub fn sign(&self) -> &'static str {
            match self {
                Self::Minus => "-",
                Self::PlusMinus => "+-",
                Self::Plus => "+",
                Self::TwoPlus => "++",
                Self::ThreePlus => "+++",
                Self::FourPlus => "++++",
            }
        }
    }

    impl FromStr for ShulginRating {
        type Err = crate::error::JournalError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim() {
                "-" => Ok(Self::Minus),
                "+-" | "±" => Ok(Self::PlusMinus),
                "+" => Ok(Self::Plus),
                "++" => Ok(Self::TwoPlus),
                "+++" => Ok(Self::ThreePlus),
                "++++" => Ok(Self::FourPlus),
                other => Err(crate::error::JournalError::InvalidRating(other.to_string())),
            }
        }
    }

    /// A user-defined grouping of ingestions
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Experience {
        /// Unique identifier: exp:<hash>
        pub id: String,
        /// Title
        pub title: String,
        /// Free-form notes
        #[serde(default)]
        pub text: String,
        /// When the experience was created
        pub created_at: DateTime<Utc>,
        /// Earliest ingestion time, or creation time when empty
        pub sort_date: DateTime<Utc>,
        /// Marked as favorite
        #[serde(default)]
        pub is_favorite: bool,
        /// Overall rating
        #[serde(default)]
        pub rating: Option<ShulginRating>,
    }

    impl Experience {
        /// Create an experience with a deterministic ID
        #[must_use]
        pub fn new(title: &str, created_at: DateTime<Utc>) -> Self {
            Self {
                id: Self::generate_id(title, created_at),
                title: title.to_string(),
                text: String::new(),
                created_at,
                sort_date: created_at,
                is_favorite: false,
                rating: None,
            }
        }

        /// Generate a deterministic ID for an experience
        #[must_use]
        pub fn generate_id(title: &str, created_at: DateTime<Utc>) -> String {
            let mut hasher = Sha256::new();
            hasher.update(title.as_bytes());
            hasher.update(created_at.to_rfc3339().as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("exp:{}", &hash[..10])
        }
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// A single recorded instance of consuming a substance
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Ingestion {
        /// Unique identifier: ing:<hash>
        pub id: String,
        /// Owning experience
        pub experience_id: String,
        /// Substance name as logged
        pub substance: String,
        /// When it was taken
        pub time: DateTime<Utc>,
        /// Route of administration
        pub route: AdministrationRoute,
        /// Dose in `units`, `None` when unknown
        pub dose: Option<f64>,
        /// Dose units (mg, µg, mL ...)
        pub units: String,
        /// Dose is an estimate
        #[serde(default)]
        pub is_estimate: bool,
        /// Standard deviation of an estimated dose
        #[serde(default)]
        pub estimated_dose_sd: Option<f64>,
        /// Purity in percent
        #[serde(default)]
        pub purity: Option<f64>,
        /// Notes
        #[serde(default)]
        pub notes: String,
        /// When the record was created
        pub created_at: DateTime<Utc>,
    }

    impl Ingestion {
        /// Generate a deterministic ID for an ingestion
        #[must_use]
        pub fn generate_id(
            experience_id: &str,
            substance: &str,
            time: DateTime<Utc>,
            route: AdministrationRoute,
        ) -> String {
            let mut hasher = Sha256::new();
            hasher.update(experience_id.as_bytes());
            hasher.update(substance.as_bytes());
            hasher.update(time.to_rfc3339().as_bytes());
            hasher.update(route.name().as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("ing:{}", &hash[..10])
        }
    }

    // =========================================================================
    // Companions and custom substances
    // =========================================================================

    /// Per-substance display settings
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SubstanceCompanion {
        /// Substance name
        pub substance: String,
        /// Display color
        pub color: SubstanceColor,
    }

    /// A substance the reference dataset does not know about
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CustomSubstance {
        /// Name
        pub name: String,
        /// Default units
        pub units: String,
        /// Description
        #[serde(default)]
        pub description: String,
    }

    // =========================================================================
    // Journal Store
    // =========================================================================

    /// Everything the journal persists
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct JournalStore {
        /// All experiences
        #[serde(default)]
        pub experiences: Vec<Experience>,
        /// All ingestions
        #[serde(default)]
        pub ingestions: Vec<Ingestion>,
        /// Substance companions
        #[serde(default)]
        pub companions: Vec<SubstanceCompanion>,
        /// Custom substances
        #[serde(default)]
        pub custom_substances: Vec<CustomSubstance>,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{JournalError, JournalResult};
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
