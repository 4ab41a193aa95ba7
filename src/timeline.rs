// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Duration ranges and experience timelines
//!
//! A timeline is a set of piecewise-linear curves in seconds relative to the
//! first ingestion of an experience. Each ingestion gets a curve whose shape
//! depends on how much duration data the dataset has for its route; curves of
//! the same substance are also summed so redoses show up as one line.

use crate::substance::SubstanceRepo;
use crate::types::Ingestion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Default position between minimum and maximum phase durations
pub const DEFAULT_WEIGHT: f64 = 0.5;

// =============================================================================
// Duration ranges
// =============================================================================

/// Units a duration range is given in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnits {
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
    /// Days
    Days,
}

impl DurationUnits {
    /// Length of one unit in seconds
    #[must_use]
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
            Self::Days => 86_400.0,
        }
    }
}

/// A min/max duration as found in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Shortest
    pub min: Option<f64>,
    /// Longest
    pub max: Option<f64>,
    /// Units of min and max
    pub units: DurationUnits,
}

impl DurationRange {
    /// Minimum in seconds, falling back to the maximum
    #[must_use]
    pub fn min_secs(&self) -> Option<f64> {
        self.min.or(self.max).map(|v| v * self.units.seconds())
    }

    /// Maximum in seconds, falling back to the minimum
    #[must_use]
    pub fn max_secs(&self) -> Option<f64> {
        self.max.or(self.min).map(|v| v * self.units.seconds())
    }

    /// Point between min (`weight` 0) and max (`weight` 1), in seconds
    #[must_use]
    pub fn interpolate(&self, weight: f64) -> Option<f64> {
        let (min, max) = (self.min_secs()?, self.max_secs()?);
        Some(min + (max - min) * weight.clamp(0.0, 1.0))
    }
}

impl fmt::Display for DurationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.units {
            DurationUnits::Seconds => "s",
            DurationUnits::Minutes => "min",
            DurationUnits::Hours => "h",
            DurationUnits::Days => "d",
        };
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min}-{max} {unit}"),
            (Some(v), None) | (None, Some(v)) => write!(f, "{v} {unit}"),
            (None, None) => write!(f, "unknown"),
        }
    }
}

/// Reference durations for one route
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoaDuration {
    /// Time until first effects
    pub onset: Option<DurationRange>,
    /// Time from onset to peak
    pub comeup: Option<DurationRange>,
    /// Length of the peak
    pub peak: Option<DurationRange>,
    /// Time from peak to baseline
    pub offset: Option<DurationRange>,
    /// Whole duration
    pub total: Option<DurationRange>,
    /// Lingering after-effects
    pub afterglow: Option<DurationRange>,
}

/// Render seconds as `2h 05m` / `45m` / `30s`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_secs(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m")
    } else {
        format!("{s}s")
    }
}

// =============================================================================
// Curves
// =============================================================================

/// One vertex of a timeline curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimelinePoint {
    /// Seconds since the experience started
    pub t: f64,
    /// Relative intensity
    pub value: f64,
}

impl TimelinePoint {
    fn new(t: f64, value: f64) -> Self {
        Self { t, value }
    }
}

/// Value of a piecewise-linear curve at `t`; zero outside the curve
#[must_use]
pub fn curve_value(points: &[TimelinePoint], t: f64) -> f64 {
    match points {
        [] => 0.0,
        [only] => {
            if (only.t - t).abs() < f64::EPSILON {
                only.value
            } else {
                0.0
            }
        }
        _ => points
            .windows(2)
            .find(|w| w[0].t <= t && t <= w[1].t)
            .map_or(0.0, |w| {
                let dt = w[1].t - w[0].t;
                if dt <= 0.0 {
                    w[0].value.max(w[1].value)
                } else {
                    w[0].value + (w[1].value - w[0].value) * (t - w[0].t) / dt
                }
            }),
    }
}

/// Which duration data a curve was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineShape {
    /// Onset, comeup, peak and offset all known
    Full,
    /// Onset and total known, the rest inferred from the total
    Partial,
    /// Only the total duration known
    TotalOnly,
    /// Some leading phases known, no end
    Open,
    /// No duration data
    Unknown,
}

/// Named phase of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Before effects
    Onset,
    /// Rising
    Comeup,
    /// Full effects
    Peak,
    /// Wearing off
    Offset,
    /// Whole duration when phases are unknown
    Total,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Onset => "onset",
            Self::Comeup => "comeup",
            Self::Peak => "peak",
            Self::Offset => "offset",
            Self::Total => "total",
        };
        f.write_str(name)
    }
}

/// A phase placed on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseSpan {
    /// Phase
    pub phase: Phase,
    /// Start in seconds since experience start
    pub start: f64,
    /// End in seconds since experience start
    pub end: f64,
}

/// The curve of a single ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionTimeline {
    /// Ingestion the curve belongs to
    pub ingestion_id: String,
    /// Canonical substance name
    pub substance: String,
    /// Seconds between experience start and this ingestion
    pub start_secs: f64,
    /// Peak height relative to the largest dose of the same substance
    pub height: f64,
    /// Data the curve was drawn from
    pub shape: TimelineShape,
    /// Parts of the curve are guessed rather than from phase data
    pub inferred: bool,
    /// The end of the effects is unknown
    pub open_ended: bool,
    /// Curve vertices
    pub points: Vec<TimelinePoint>,
    /// Phases with weighted durations
    pub phases: Vec<PhaseSpan>,
    /// Earliest and latest possible peak start
    pub peak_range: Option<(f64, f64)>,
    /// Earliest and latest possible end
    pub end_range: Option<(f64, f64)>,
}

impl IngestionTimeline {
    /// Build the curve for one ingestion.
    ///
    /// `start_secs` places the ingestion relative to the experience start,
    /// `weight` picks a point between the minimum and maximum durations.
    #[must_use]
    pub fn build(
        ingestion: &Ingestion,
        substance: &str,
        start_secs: f64,
        duration: Option<&RoaDuration>,
        height: f64,
        weight: f64,
    ) -> Self {
        let mut timeline = Self {
            ingestion_id: ingestion.id.clone(),
            substance: substance.to_string(),
            start_secs,
            height,
            shape: TimelineShape::Unknown,
            inferred: false,
            open_ended: true,
            points: vec![TimelinePoint::new(start_secs, 0.0)],
            phases: Vec::new(),
            peak_range: None,
            end_range: None,
        };

        let Some(d) = duration else {
            return timeline;
        };
        let at = |r: Option<DurationRange>| r.and_then(|r| r.interpolate(weight));
        let (onset, comeup, peak, offset, total) =
            (at(d.onset), at(d.comeup), at(d.peak), at(d.offset), at(d.total));

        match (onset, comeup, peak, offset, total) {
            (Some(o), Some(c), Some(p), Some(f), _) => timeline.full(d, o, c, p, f),
            (Some(o), _, _, _, Some(t)) if t > o => timeline.partial(d, o, comeup, peak, t),
            (_, _, _, _, Some(t)) => timeline.total_only(d, t),
            (Some(o), _, _, _, None) => timeline.open(o, comeup, peak),
            _ => {}
        }
        timeline
    }

    fn push(&mut self, t: f64, value: f64) {
        self.points.push(TimelinePoint::new(self.start_secs + t, value));
    }

    fn span(&mut self, phase: Phase, start: f64, end: f64) {
        self.phases.push(PhaseSpan {
            phase,
            start: self.start_secs + start,
            end: self.start_secs + end,
        });
    }

    fn full(&mut self, d: &RoaDuration, o: f64, c: f64, p: f64, f: f64) {
        let h = self.height;
        self.shape = TimelineShape::Full;
        self.open_ended = false;
        self.push(o, 0.0);
        self.push(o + c, h);
        self.push(o + c + p, h);
        self.push(o + c + p + f, 0.0);

        self.span(Phase::Onset, 0.0, o);
        self.span(Phase::Comeup, o, o + c);
        self.span(Phase::Peak, o + c, o + c + p);
        self.span(Phase::Offset, o + c + p, o + c + p + f);

        let phases = [d.onset, d.comeup, d.peak, d.offset];
        let sum = |pick: fn(&DurationRange) -> Option<f64>, n: usize| -> f64 {
            phases[..n].iter().flatten().filter_map(pick).sum()
        };
        let s = self.start_secs;
        self.peak_range = Some((
            s + sum(DurationRange::min_secs, 2),
            s + sum(DurationRange::max_secs, 2),
        ));
        self.end_range = Some((
            s + sum(DurationRange::min_secs, 4),
            s + sum(DurationRange::max_secs, 4),
        ));
    }

    fn partial(&mut self, d: &RoaDuration, o: f64, comeup: Option<f64>, peak: Option<f64>, t: f64) {
        let h = self.height;
        self.shape = TimelineShape::Partial;
        self.inferred = true;
        self.open_ended = false;

        let rise_end = (o + comeup.unwrap_or((t - o) / 2.0)).min(t);
        let peak_end = (rise_end + peak.unwrap_or(0.0)).min(t);

        self.push(o, 0.0);
        self.push(rise_end, h);
        if peak_end > rise_end {
            self.push(peak_end, h);
        }
        self.push(t, 0.0);

        self.span(Phase::Onset, 0.0, o);
        self.span(Phase::Comeup, o, rise_end);
        if peak_end > rise_end {
            self.span(Phase::Peak, rise_end, peak_end);
        }
        self.span(Phase::Offset, peak_end, t);
        self.end_range = total_range(d, self.start_secs);
    }

    fn total_only(&mut self, d: &RoaDuration, t: f64) {
        self.shape = TimelineShape::TotalOnly;
        self.inferred = true;
        self.open_ended = false;
        self.push(t / 2.0, self.height);
        self.push(t, 0.0);
        self.span(Phase::Total, 0.0, t);
        self.end_range = total_range(d, self.start_secs);
    }

    fn open(&mut self, o: f64, comeup: Option<f64>, peak: Option<f64>) {
        let h = self.height;
        self.shape = TimelineShape::Open;
        self.push(o, 0.0);
        self.span(Phase::Onset, 0.0, o);
        if let Some(c) = comeup {
            self.push(o + c, h);
            self.span(Phase::Comeup, o, o + c);
            if let Some(p) = peak {
                self.push(o + c + p, h);
                self.span(Phase::Peak, o + c, o + c + p);
            }
        }
    }

    /// When effects end, if known
    #[must_use]
    pub fn end_secs(&self) -> Option<f64> {
        if self.open_ended {
            None
        } else {
            self.points.last().map(|p| p.t)
        }
    }

    /// Phase active at `t`
    #[must_use]
    pub fn phase_at(&self, t: f64) -> Option<Phase> {
        self.phases
            .iter()
            .find(|p| p.start <= t && t < p.end)
            .map(|p| p.phase)
    }
}

fn total_range(d: &RoaDuration, start: f64) -> Option<(f64, f64)> {
    let total = d.total?;
    Some((start + total.min_secs()?, start + total.max_secs()?))
}

// =============================================================================
// Experience timeline
// =============================================================================

/// Sum of the curves of every ingestion of one substance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstanceCurve {
    /// Canonical substance name
    pub substance: String,
    /// Summed vertices
    pub points: Vec<TimelinePoint>,
    /// Open-ended ingestions were left out of the sum
    pub incomplete: bool,
}

/// All curves of an experience
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceTimeline {
    /// Time of the first ingestion
    pub start: DateTime<Utc>,
    /// Per-ingestion curves in time order
    pub ingestions: Vec<IngestionTimeline>,
    /// Per-substance summed curves
    pub substances: Vec<SubstanceCurve>,
    /// Latest known end of effects
    pub end_secs: Option<f64>,
    /// Seconds since start, when now falls inside the timeline
    pub now_secs: Option<f64>,
}

impl ExperienceTimeline {
    /// Build the timeline of a set of ingestions; `None` when there are none
    #[must_use]
    pub fn build(
        ingestions: &[Ingestion],
        repo: &SubstanceRepo,
        weight: f64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let mut sorted: Vec<&Ingestion> = ingestions.iter().collect();
        sorted.sort_by_key(|i| i.time);
        let start = sorted.first()?.time;

        let canonical = |i: &Ingestion| {
            repo.get(&i.substance)
                .map_or_else(|| i.substance.clone(), |s| s.name.clone())
        };

        let mut max_dose: HashMap<String, f64> = HashMap::new();
        for ingestion in &sorted {
            if let Some(dose) = ingestion.pure_dose() {
                let entry = max_dose.entry(canonical(ingestion)).or_insert(0.0);
                *entry = entry.max(dose);
            }
        }

        let timelines: Vec<IngestionTimeline> = sorted
            .iter()
            .map(|ingestion| {
                let name = canonical(ingestion);
                let height = match (ingestion.pure_dose(), max_dose.get(&name)) {
                    (Some(dose), Some(&max)) if max > 0.0 => dose / max,
                    _ => 1.0,
                };
                let duration = repo
                    .get(&name)
                    .and_then(|s| s.roa(ingestion.route))
                    .and_then(|r| r.duration.as_ref());
                IngestionTimeline::build(
                    ingestion,
                    &name,
                    seconds_between(start, ingestion.time),
                    duration,
                    height,
                    weight,
                )
            })
            .collect();

        let substances = sum_curves(&timelines);
        let end_secs = timelines
            .iter()
            .filter_map(IngestionTimeline::end_secs)
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.max(e))));

        let elapsed = seconds_between(start, now);
        let now_secs = (elapsed >= 0.0 && end_secs.map_or(true, |end| elapsed <= end))
            .then_some(elapsed);

        Some(Self {
            start,
            ingestions: timelines,
            substances,
            end_secs,
            now_secs,
        })
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

fn sum_curves(timelines: &[IngestionTimeline]) -> Vec<SubstanceCurve> {
    let mut grouped: BTreeMap<&str, Vec<&IngestionTimeline>> = BTreeMap::new();
    for timeline in timelines {
        grouped.entry(&timeline.substance).or_default().push(timeline);
    }

    grouped
        .into_iter()
        .map(|(substance, members)| {
            let closed: Vec<&IngestionTimeline> =
                members.iter().copied().filter(|m| !m.open_ended).collect();

            let mut ts: Vec<f64> = closed
                .iter()
                .flat_map(|m| m.points.iter().map(|p| p.t))
                .collect();
            ts.sort_by(f64::total_cmp);
            ts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

            let points = ts
                .into_iter()
                .map(|t| {
                    let value = closed.iter().map(|m| curve_value(&m.points, t)).sum();
                    TimelinePoint::new(t, value)
                })
                .collect();

            SubstanceCurve {
                substance: substance.to_string(),
                points,
                incomplete: closed.len() < members.len(),
            }
        })
        .collect()
}
