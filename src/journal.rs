// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Journal store: experiences, ingestions and substance companions
//!
//! The whole journal lives in a single `journal.json` in the data directory.
//! It is small enough to load and rewrite on every command.

use crate::color::{self, SubstanceColor};
use crate::error::{JournalError, JournalResult};
use crate::substance::SubstanceRepo;
use crate::types::{
    AdministrationRoute, CustomSubstance, Experience, Ingestion, JournalStore, SubstanceCompanion,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// File name inside the data directory
pub const JOURNAL_FILE: &str = "journal.json";

/// What a new ingestion should look like
#[derive(Debug, Clone)]
pub struct NewIngestion {
    /// Substance name as typed
    pub substance: String,
    /// When it was taken
    pub time: DateTime<Utc>,
    /// Route
    pub route: AdministrationRoute,
    /// Dose, `None` if unknown
    pub dose: Option<f64>,
    /// Dose units
    pub units: String,
    /// Dose is an estimate
    pub is_estimate: bool,
    /// Standard deviation of the estimate
    pub estimated_dose_sd: Option<f64>,
    /// Purity percent
    pub purity: Option<f64>,
    /// Notes
    pub notes: String,
}

/// Counts reported by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// New experiences
    pub experiences: usize,
    /// New ingestions
    pub ingestions: usize,
    /// New companions
    pub companions: usize,
    /// New custom substances
    pub custom_substances: usize,
}

/// The user's journal
#[derive(Debug, Clone, Default)]
pub struct Journal {
    /// Persisted records
    pub store: JournalStore,
}

impl Journal {
    /// Create an empty journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the journal from a data directory; a missing file is an empty journal
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(JOURNAL_FILE);
        if !path.exists() {
            debug!("No journal at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        Self::read_store(&path).map(|store| Self { store })
    }

    fn read_store(path: &Path) -> Result<JournalStore> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save the journal to a data directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let path = dir.join(JOURNAL_FILE);
        let tmp = dir.join(format!("{JOURNAL_FILE}.tmp"));
        let json = serde_json::to_string_pretty(&self.store).context("Failed to serialize journal")?;
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        debug!("Saved journal to {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Experiences
    // =========================================================================

    /// Add an experience, returning its id
    pub fn add_experience(&mut self, title: &str, created_at: DateTime<Utc>) -> String {
        let experience = Experience::new(title, created_at);
        let id = experience.id.clone();
        if !self.store.experiences.iter().any(|e| e.id == id) {
            self.store.experiences.push(experience);
        }
        id
    }

    /// Find an experience by id, exact title or unique title prefix
    pub fn resolve_experience(&self, query: &str) -> JournalResult<&Experience> {
        let experiences = &self.store.experiences;
        if let Some(e) = experiences.iter().find(|e| e.id == query) {
            return Ok(e);
        }
        if let Some(e) = experiences.iter().find(|e| e.title == query) {
            return Ok(e);
        }

        let needle = query.to_lowercase();
        let matches: Vec<&Experience> = experiences
            .iter()
            .filter(|e| e.title.to_lowercase().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(JournalError::ExperienceNotFound(query.to_string())),
            [only] => Ok(only),
            many => Err(JournalError::AmbiguousExperience {
                query: query.to_string(),
                count: many.len(),
            }),
        }
    }

    fn experience_mut(&mut self, id: &str) -> JournalResult<&mut Experience> {
        self.store
            .experiences
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| JournalError::ExperienceNotFound(id.to_string()))
    }

    /// Mutable access to an experience for editing title, notes and rating
    pub fn edit_experience(&mut self, query: &str) -> JournalResult<&mut Experience> {
        let id = self.resolve_experience(query)?.id.clone();
        self.experience_mut(&id)
    }

    /// Delete an experience and its ingestions; returns how many ingestions went with it
    pub fn delete_experience(&mut self, query: &str) -> JournalResult<usize> {
        let id = self.resolve_experience(query)?.id.clone();
        self.store.experiences.retain(|e| e.id != id);
        let before = self.store.ingestions.len();
        self.store.ingestions.retain(|i| i.experience_id != id);
        let removed = before - self.store.ingestions.len();
        info!("Deleted experience {} with {} ingestions", id, removed);
        Ok(removed)
    }

    /// Experiences, most recent first
    #[must_use]
    pub fn experiences(&self) -> Vec<&Experience> {
        let mut all: Vec<&Experience> = self.store.experiences.iter().collect();
        all.sort_by(|a, b| b.sort_date.cmp(&a.sort_date).then_with(|| a.title.cmp(&b.title)));
        all
    }

    // =========================================================================
    // Ingestions
    // =========================================================================

    /// Record an ingestion in an existing experience, returning its id.
    ///
    /// Validates dose, deviation and purity, names the substance the way the
    /// dataset does, and gives a new substance a companion color.
    pub fn add_ingestion(
        &mut self,
        experience_id: &str,
        new: NewIngestion,
        repo: &SubstanceRepo,
        now: DateTime<Utc>,
    ) -> JournalResult<String> {
        if let Some(dose) = new.dose {
            if !dose.is_finite() || dose <= 0.0 {
                return Err(JournalError::InvalidDose(dose));
            }
        }
        if let Some(sd) = new.estimated_dose_sd {
            if !sd.is_finite() || sd < 0.0 {
                return Err(JournalError::InvalidDeviation(sd));
            }
        }
        if let Some(purity) = new.purity {
            if !purity.is_finite() || purity <= 0.0 || purity > 100.0 {
                return Err(JournalError::InvalidPurity(purity));
            }
        }

        let substance = repo
            .get(&new.substance)
            .map(|s| s.name.clone())
            .or_else(|| {
                self.store
                    .custom_substances
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(new.substance.trim()))
                    .map(|c| c.name.clone())
            })
            .unwrap_or_else(|| new.substance.trim().to_string());

        self.experience_mut(experience_id)?;

        let id = Ingestion::generate_id(experience_id, &substance, new.time, new.route);
        if self.store.ingestions.iter().any(|i| i.id == id) {
            debug!("Ingestion {} already recorded", id);
            return Ok(id);
        }

        self.ensure_companion(&substance);
        self.store.ingestions.push(Ingestion {
            id: id.clone(),
            experience_id: experience_id.to_string(),
            substance,
            time: new.time,
            route: new.route,
            dose: new.dose,
            units: new.units,
            is_estimate: new.is_estimate,
            estimated_dose_sd: new.estimated_dose_sd,
            purity: new.purity,
            notes: new.notes,
            created_at: now,
        });
        self.refresh_sort_date(experience_id);
        Ok(id)
    }

    /// Remove an ingestion by id or unique id prefix
    pub fn delete_ingestion(&mut self, id: &str) -> JournalResult<Ingestion> {
        let id = id.trim();
        if id.is_empty() {
            return Err(JournalError::IngestionNotFound(String::new()));
        }
        let matches: Vec<usize> = self
            .store
            .ingestions
            .iter()
            .enumerate()
            .filter(|(_, i)| i.id == id || i.id.starts_with(id))
            .map(|(pos, _)| pos)
            .collect();
        let pos = match matches.as_slice() {
            [pos] => *pos,
            [] => return Err(JournalError::IngestionNotFound(id.to_string())),
            many => {
                return Err(JournalError::AmbiguousIngestion {
                    query: id.to_string(),
                    count: many.len(),
                })
            }
        };
        let removed = self.store.ingestions.remove(pos);
        self.refresh_sort_date(&removed.experience_id);
        Ok(removed)
    }

    fn refresh_sort_date(&mut self, experience_id: &str) {
        let earliest = self
            .store
            .ingestions
            .iter()
            .filter(|i| i.experience_id == experience_id)
            .map(|i| i.time)
            .min();
        if let Ok(experience) = self.experience_mut(experience_id) {
            experience.sort_date = earliest.unwrap_or(experience.created_at);
        }
    }

    /// Ingestions of an experience in time order
    #[must_use]
    pub fn ingestions_of(&self, experience_id: &str) -> Vec<Ingestion> {
        let mut found: Vec<Ingestion> = self
            .store
            .ingestions
            .iter()
            .filter(|i| i.experience_id == experience_id)
            .cloned()
            .collect();
        found.sort_by_key(|i| i.time);
        found
    }

    /// All ingestions taken at or after `since`, in time order
    #[must_use]
    pub fn ingestions_since(&self, since: DateTime<Utc>) -> Vec<&Ingestion> {
        let mut found: Vec<&Ingestion> = self
            .store
            .ingestions
            .iter()
            .filter(|i| i.time >= since)
            .collect();
        found.sort_by_key(|i| i.time);
        found
    }

    // =========================================================================
    // Companions and custom substances
    // =========================================================================

    /// Color of a substance, if it has a companion
    #[must_use]
    pub fn color_of(&self, substance: &str) -> Option<SubstanceColor> {
        self.store
            .companions
            .iter()
            .find(|c| c.substance.eq_ignore_ascii_case(substance))
            .map(|c| c.color)
    }

    fn ensure_companion(&mut self, substance: &str) -> SubstanceColor {
        if let Some(color) = self.color_of(substance) {
            return color;
        }
        let color = color::suggest(self.store.companions.iter().map(|c| &c.color));
        self.store.companions.push(SubstanceCompanion {
            substance: substance.to_string(),
            color,
        });
        color
    }

    /// Set the display color of a substance
    pub fn set_color(&mut self, substance: &str, color: SubstanceColor) {
        match self
            .store
            .companions
            .iter_mut()
            .find(|c| c.substance.eq_ignore_ascii_case(substance))
        {
            Some(companion) => companion.color = color,
            None => self.store.companions.push(SubstanceCompanion {
                substance: substance.to_string(),
                color,
            }),
        }
    }

    /// Register a substance that is missing from the dataset
    pub fn add_custom_substance(
        &mut self,
        custom: CustomSubstance,
        repo: &SubstanceRepo,
    ) -> JournalResult<()> {
        let exists = repo.get(&custom.name).is_some()
            || self
                .store
                .custom_substances
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&custom.name));
        if exists {
            return Err(JournalError::SubstanceExists(custom.name));
        }
        self.store.custom_substances.push(custom);
        Ok(())
    }

    /// Custom substance by name
    #[must_use]
    pub fn custom_substance(&self, name: &str) -> Option<&CustomSubstance> {
        self.store
            .custom_substances
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    // =========================================================================
    // Export / import
    // =========================================================================

    /// Write the whole journal to a JSON file
    pub fn export(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.store).context("Failed to serialize journal")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Merge a previously exported journal; records already present are skipped
    pub fn import(&mut self, path: &Path) -> Result<ImportSummary> {
        let incoming = Self::read_store(path)?;
        Ok(self.merge(incoming))
    }

    /// Merge another store into this one by id
    pub fn merge(&mut self, incoming: JournalStore) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let mut touched: Vec<String> = Vec::new();

        for experience in incoming.experiences {
            if !self.store.experiences.iter().any(|e| e.id == experience.id) {
                self.store.experiences.push(experience);
                summary.experiences += 1;
            }
        }
        for ingestion in incoming.ingestions {
            let known_experience = self
                .store
                .experiences
                .iter()
                .any(|e| e.id == ingestion.experience_id);
            if known_experience && !self.store.ingestions.iter().any(|i| i.id == ingestion.id) {
                if !touched.contains(&ingestion.experience_id) {
                    touched.push(ingestion.experience_id.clone());
                }
                self.store.ingestions.push(ingestion);
                summary.ingestions += 1;
            }
        }
        for experience_id in &touched {
            self.refresh_sort_date(experience_id);
        }
        for companion in incoming.companions {
            if self.color_of(&companion.substance).is_none() {
                self.store.companions.push(companion);
                summary.companions += 1;
            }
        }
        for custom in incoming.custom_substances {
            if self.custom_substance(&custom.name).is_none() {
                self.store.custom_substances.push(custom);
                summary.custom_substances += 1;
            }
        }

        let substances: Vec<String> = self
            .store
            .ingestions
            .iter()
            .map(|i| i.substance.clone())
            .collect();
        for substance in substances {
            self.ensure_companion(&substance);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn new_ingestion(substance: &str, dose: Option<f64>, hour: u32) -> NewIngestion {
        NewIngestion {
            substance: substance.into(),
            time: at(hour),
            route: AdministrationRoute::Oral,
            dose,
            units: "mg".into(),
            is_estimate: false,
            estimated_dose_sd: None,
            purity: None,
            notes: String::new(),
        }
    }

    #[test]
    fn test_add_ingestion_canonicalizes_and_colors() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let exp = journal.add_experience("Festival", at(12));

        journal
            .add_ingestion(&exp, new_ingestion("molly", Some(80.0), 20), &repo, at(20))
            .unwrap();
        journal
            .add_ingestion(&exp, new_ingestion("caffeine", Some(100.0), 10), &repo, at(20))
            .unwrap();

        let ingestions = journal.ingestions_of(&exp);
        assert_eq!(ingestions[0].substance, "Caffeine");
        assert_eq!(ingestions[1].substance, "MDMA");
        assert_eq!(journal.color_of("MDMA"), Some(SubstanceColor::Blue));
        assert_eq!(journal.color_of("Caffeine"), Some(SubstanceColor::Orange));
        assert_eq!(journal.resolve_experience(&exp).unwrap().sort_date, at(10));
    }

    #[test]
    fn test_add_ingestion_validates() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let exp = journal.add_experience("Night", at(12));

        let err = journal
            .add_ingestion(&exp, new_ingestion("MDMA", Some(-1.0), 20), &repo, at(20))
            .unwrap_err();
        assert!(matches!(err, JournalError::InvalidDose(_)));

        let mut bad_purity = new_ingestion("MDMA", Some(100.0), 20);
        bad_purity.purity = Some(120.0);
        assert!(matches!(
            journal.add_ingestion(&exp, bad_purity, &repo, at(20)),
            Err(JournalError::InvalidPurity(_))
        ));

        assert!(matches!(
            journal.add_ingestion("exp:missing", new_ingestion("MDMA", None, 20), &repo, at(20)),
            Err(JournalError::ExperienceNotFound(_))
        ));
        assert!(journal.store.ingestions.is_empty());
    }

    #[test]
    fn test_add_ingestion_is_idempotent() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let exp = journal.add_experience("Night", at(12));
        let a = journal
            .add_ingestion(&exp, new_ingestion("MDMA", Some(80.0), 20), &repo, at(20))
            .unwrap();
        let b = journal
            .add_ingestion(&exp, new_ingestion("MDMA", Some(80.0), 20), &repo, at(21))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(journal.store.ingestions.len(), 1);
    }

    #[test]
    fn test_resolve_experience() {
        let mut journal = Journal::new();
        journal.add_experience("Beach day", at(1));
        journal.add_experience("Beach night", at(2));
        journal.add_experience("Concert", at(3));

        assert_eq!(journal.resolve_experience("conc").unwrap().title, "Concert");
        assert_eq!(journal.resolve_experience("Beach day").unwrap().title, "Beach day");
        assert!(matches!(
            journal.resolve_experience("beach"),
            Err(JournalError::AmbiguousExperience { count: 2, .. })
        ));
        assert!(matches!(
            journal.resolve_experience("opera"),
            Err(JournalError::ExperienceNotFound(_))
        ));
    }

    #[test]
    fn test_delete_experience_cascades() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let keep = journal.add_experience("Keep", at(1));
        let drop = journal.add_experience("Drop", at(2));
        journal.add_ingestion(&keep, new_ingestion("LSD", None, 3), &repo, at(3)).unwrap();
        journal.add_ingestion(&drop, new_ingestion("LSD", None, 4), &repo, at(4)).unwrap();
        journal.add_ingestion(&drop, new_ingestion("MDMA", None, 5), &repo, at(5)).unwrap();

        assert_eq!(journal.delete_experience("Drop").unwrap(), 2);
        assert_eq!(journal.store.experiences.len(), 1);
        assert!(journal.store.ingestions.iter().all(|i| i.experience_id == keep));
    }

    #[test]
    fn test_delete_ingestion_refreshes_sort_date() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let exp = journal.add_experience("Night", at(23));
        let early = journal.add_ingestion(&exp, new_ingestion("LSD", None, 1), &repo, at(1)).unwrap();
        journal.add_ingestion(&exp, new_ingestion("MDMA", None, 5), &repo, at(5)).unwrap();

        journal.delete_ingestion(&early).unwrap();
        assert_eq!(journal.resolve_experience(&exp).unwrap().sort_date, at(5));
        assert!(journal.delete_ingestion("ing:nope").is_err());
    }

    #[test]
    fn test_sort_date_follows_first_ingestion() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let party = journal.add_experience("Party", at(12));
        let quiet = journal.add_experience("Quiet", at(15));
        assert_eq!(journal.resolve_experience(&party).unwrap().sort_date, at(12));

        journal.add_ingestion(&party, new_ingestion("MDMA", Some(80.0), 20), &repo, at(20)).unwrap();
        assert_eq!(journal.resolve_experience(&party).unwrap().sort_date, at(20));
        assert_eq!(journal.experiences()[0].id, party);

        journal.add_ingestion(&party, new_ingestion("LSD", None, 18), &repo, at(20)).unwrap();
        assert_eq!(journal.resolve_experience(&party).unwrap().sort_date, at(18));
        assert_eq!(journal.resolve_experience(&quiet).unwrap().sort_date, at(15));
    }

    #[test]
    fn test_merge_refreshes_sort_date() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut source = Journal::new();
        let exp = source.add_experience("Party", at(12));
        source.add_ingestion(&exp, new_ingestion("MDMA", Some(80.0), 3), &repo, at(3)).unwrap();

        let mut target = Journal::new();
        target.add_experience("Party", at(12));
        assert_eq!(target.resolve_experience(&exp).unwrap().sort_date, at(12));

        let summary = target.merge(source.store);
        assert_eq!(summary.experiences, 0);
        assert_eq!(summary.ingestions, 1);
        assert_eq!(target.resolve_experience(&exp).unwrap().sort_date, at(3));
    }

    #[test]
    fn test_delete_ingestion_rejects_empty_and_ambiguous_ids() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let exp = journal.add_experience("Night", at(1));
        journal.add_ingestion(&exp, new_ingestion("LSD", None, 2), &repo, at(2)).unwrap();

        assert!(matches!(journal.delete_ingestion(""), Err(JournalError::IngestionNotFound(_))));
        assert!(matches!(journal.delete_ingestion("  "), Err(JournalError::IngestionNotFound(_))));
        assert_eq!(journal.store.ingestions.len(), 1);

        journal.add_ingestion(&exp, new_ingestion("MDMA", None, 3), &repo, at(3)).unwrap();
        assert!(matches!(
            journal.delete_ingestion("ing:"),
            Err(JournalError::AmbiguousIngestion { count: 2, .. })
        ));
        assert_eq!(journal.store.ingestions.len(), 2);
    }

    #[test]
    fn test_save_load_and_merge() {
        let repo = SubstanceRepo::bundled().unwrap();
        let dir = TempDir::new().unwrap();
        let mut journal = Journal::new();
        let exp = journal.add_experience("Night", at(1));
        journal.add_ingestion(&exp, new_ingestion("LSD", Some(100.0), 2), &repo, at(2)).unwrap();
        journal.save(dir.path()).unwrap();

        let loaded = Journal::load(dir.path()).unwrap();
        assert_eq!(loaded.store, journal.store);

        let mut other = Journal::new();
        let summary = other.merge(loaded.store.clone());
        assert_eq!(summary.experiences, 1);
        assert_eq!(summary.ingestions, 1);
        let again = other.merge(loaded.store);
        assert_eq!(again, ImportSummary::default());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let journal = Journal::load(dir.path()).unwrap();
        assert!(journal.store.experiences.is_empty());
    }

    #[test]
    fn test_custom_substance_cannot_shadow_dataset() {
        let repo = SubstanceRepo::bundled().unwrap();
        let mut journal = Journal::new();
        let lsd = CustomSubstance { name: "lsd".into(), units: "µg".into(), description: String::new() };
        assert!(journal.add_custom_substance(lsd, &repo).is_err());

        let kratom = CustomSubstance { name: "Kratom".into(), units: "g".into(), description: String::new() };
        journal.add_custom_substance(kratom, &repo).unwrap();
        assert!(journal.custom_substance("kratom").is_some());
    }
}
