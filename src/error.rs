// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for the journal library

use thiserror::Error;

/// Domain errors raised by the journal and the reference dataset
#[derive(Debug, Error)]
pub enum JournalError {
    /// No experience matches the given id or title
    #[error("experience not found: {0}")]
    ExperienceNotFound(String),

    /// More than one experience matches a title prefix
    #[error("ambiguous experience '{query}': {count} experiences match, use the id")]
    AmbiguousExperience {
        /// What the user typed
        query: String,
        /// Number of matches
        count: usize,
    },

    /// No ingestion with this id
    #[error("ingestion not found: {0}")]
    IngestionNotFound(String),

    /// More than one ingestion id starts with the given prefix
    #[error("ambiguous ingestion '{query}': {count} ingestions match, use a longer id")]
    AmbiguousIngestion {
        /// What the user typed
        query: String,
        /// Number of matches
        count: usize,
    },

    /// Dose must be a positive finite number
    #[error("invalid dose {0}: must be positive and finite")]
    InvalidDose(f64),

    /// Standard deviation must be non-negative
    #[error("invalid standard deviation {0}: must be zero or positive")]
    InvalidDeviation(f64),

    /// Purity is a percentage in (0, 100]
    #[error("invalid purity {0}: must be greater than 0 and at most 100")]
    InvalidPurity(f64),

    /// Route name not recognised
    #[error("unknown route of administration: {0}")]
    UnknownRoute(String),

    /// Color name not in the palette
    #[error("unknown color: {0}")]
    UnknownColor(String),

    /// Rating symbol not on the Shulgin scale
    #[error("invalid rating '{0}': use -, +-, +, ++, +++ or ++++")]
    InvalidRating(String),

    /// A custom substance would shadow a dataset entry
    #[error("substance already exists: {0}")]
    SubstanceExists(String),

    /// The reference dataset could not be parsed
    #[error("failed to parse substance data: {0}")]
    Dataset(#[from] serde_json::Error),

    /// A wildcard interaction name could not be compiled
    #[error("invalid interaction pattern '{pattern}': {source}")]
    Pattern {
        /// The raw interaction name
        pattern: String,
        /// Underlying glob error
        #[source]
        source: globset::Error,
    },

    /// Filesystem failure while reading a dataset
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for journal library operations
pub type JournalResult<T> = std::result::Result<T, JournalError>;
