// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Substance interaction graph
//!
//! Every substance lists the names it interacts with. Those names are not
//! always substances: the wiki uses wildcards (`2C-x`, `DOx`) and class names
//! (`Stimulants`, `MAOIs`). The graph resolves all of them once against the
//! dataset into directed edges, so lookups are plain edge queries.

use crate::error::{JournalError, JournalResult};
use crate::substance::{Substance, SubstanceRepo};
use globset::{GlobBuilder, GlobMatcher};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Severity of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    /// Unknown safety
    Uncertain,
    /// Risky
    Unsafe,
    /// Dangerous
    Dangerous,
}

impl InteractionType {
    /// 1 for uncertain up to 3 for dangerous
    #[must_use]
    pub fn danger_count(&self) -> u8 {
        match self {
            Self::Uncertain => 1,
            Self::Unsafe => 2,
            Self::Dangerous => 3,
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uncertain => "uncertain",
            Self::Unsafe => "unsafe",
            Self::Dangerous => "dangerous",
        };
        f.write_str(name)
    }
}

/// How a listed name was linked to a substance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Listed by name
    Direct,
    /// Matched a wildcard such as `2C-x`
    Wildcard,
    /// Matched a category or class
    Category,
}

impl MatchKind {
    /// Lower is more specific
    fn specificity(self) -> u8 {
        match self {
            Self::Direct => 0,
            Self::Wildcard => 1,
            Self::Category => 2,
        }
    }
}

/// Edge payload: the strongest reason A lists B
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionEdge {
    /// Severity
    pub kind: InteractionType,
    /// How the name resolved
    pub via: MatchKind,
    /// Name as listed in the dataset
    pub raw: String,
}

/// A resolved interaction between two substances
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    /// Substance whose listing produced the interaction
    pub from: String,
    /// The other substance
    pub to: String,
    /// Severity
    pub kind: InteractionType,
    /// How the listed name resolved
    pub via: MatchKind,
    /// Name as listed in the dataset
    pub raw: String,
}

/// One listed name and the substances it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionEntry {
    /// Severity
    pub kind: InteractionType,
    /// Name as listed
    pub raw: String,
    /// Substances it resolved to; empty when the dataset has none
    pub resolved: Vec<String>,
}

/// Directed interaction graph over the dataset
#[derive(Debug, Default)]
pub struct InteractionGraph {
    graph: DiGraph<String, InteractionEdge>,
    /// Lowercase name or common name to node
    nodes: HashMap<String, NodeIndex>,
    /// Listing per node, in dataset order
    listings: HashMap<NodeIndex, Vec<InteractionEntry>>,
}

impl InteractionGraph {
    /// Resolve every listed interaction in the dataset
    pub fn build(repo: &SubstanceRepo) -> JournalResult<Self> {
        let mut this = Self::default();

        for substance in repo.substances() {
            let idx = this.graph.add_node(substance.name.clone());
            for common in &substance.common_names {
                this.nodes.entry(common.to_lowercase()).or_insert(idx);
            }
            this.nodes.insert(substance.name.to_lowercase(), idx);
        }

        let classes: Vec<HashSet<String>> = repo.substances().iter().map(class_names).collect();

        for (a, substance) in repo.substances().iter().enumerate() {
            let from = NodeIndex::new(a);
            let mut best: HashMap<NodeIndex, InteractionEdge> = HashMap::new();
            let mut listing = Vec::new();

            let lists = [
                (InteractionType::Dangerous, &substance.interactions.dangerous),
                (InteractionType::Unsafe, &substance.interactions.unsafe_),
                (InteractionType::Uncertain, &substance.interactions.uncertain),
            ];
            for (kind, names) in lists {
                for raw in names {
                    let targets = resolve(repo, &classes, raw)?;
                    let mut resolved = Vec::new();
                    for (b, via) in targets {
                        let to = NodeIndex::new(b);
                        if to == from {
                            continue;
                        }
                        resolved.push(repo.substances()[b].name.clone());
                        let candidate = InteractionEdge { kind, via, raw: raw.clone() };
                        let replace = best
                            .get(&to)
                            .map_or(true, |current| stronger(&candidate, current));
                        if replace {
                            best.insert(to, candidate);
                        }
                    }
                    resolved.sort();
                    listing.push(InteractionEntry { kind, raw: raw.clone(), resolved });
                }
            }

            let mut edges: Vec<(NodeIndex, InteractionEdge)> = best.into_iter().collect();
            edges.sort_by_key(|(to, _)| to.index());
            for (to, edge) in edges {
                this.graph.add_edge(from, to, edge);
            }
            this.listings.insert(from, listing);
        }

        debug!(
            "Interaction graph: {} substances, {} edges",
            this.graph.node_count(),
            this.graph.edge_count()
        );
        Ok(this)
    }

    fn node(&self, name: &str) -> Option<NodeIndex> {
        self.nodes.get(&name.trim().to_lowercase()).copied()
    }

    fn edge(&self, from: NodeIndex, to: NodeIndex) -> Option<Interaction> {
        let edge = self.graph.find_edge(from, to)?;
        let payload = &self.graph[edge];
        Some(Interaction {
            from: self.graph[from].clone(),
            to: self.graph[to].clone(),
            kind: payload.kind,
            via: payload.via,
            raw: payload.raw.clone(),
        })
    }

    /// The interaction between two substances, looking at both listings.
    ///
    /// When both list each other the more dangerous wins, `a`'s listing on a tie.
    #[must_use]
    pub fn between(&self, a: &str, b: &str) -> Option<Interaction> {
        let (ia, ib) = (self.node(a)?, self.node(b)?);
        if ia == ib {
            return None;
        }
        match (self.edge(ia, ib), self.edge(ib, ia)) {
            (Some(ab), Some(ba)) => Some(if ab.kind >= ba.kind { ab } else { ba }),
            (ab, ba) => ab.or(ba),
        }
    }

    /// Every interaction among a set of substances, most dangerous first.
    ///
    /// Names are deduplicated ignoring case and aliases; unknown names simply
    /// have no interactions.
    #[must_use]
    pub fn check(&self, names: &[String]) -> Vec<Interaction> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = names
            .iter()
            .filter(|n| {
                let key = self
                    .node(n)
                    .map_or_else(|| n.trim().to_lowercase(), |i| self.graph[i].to_lowercase());
                seen.insert(key)
            })
            .collect();

        let mut found = Vec::new();
        for (i, a) in unique.iter().enumerate() {
            for b in &unique[i + 1..] {
                if let Some(interaction) = self.between(a, b) {
                    found.push(interaction);
                }
            }
        }

        found.sort_by(|x, y| {
            y.kind
                .cmp(&x.kind)
                .then_with(|| x.from.cmp(&y.from))
                .then_with(|| x.to.cmp(&y.to))
        });
        found
    }

    /// What a substance lists, with each listed name resolved
    #[must_use]
    pub fn listing(&self, name: &str) -> Option<&[InteractionEntry]> {
        let idx = self.node(name)?;
        self.listings.get(&idx).map(Vec::as_slice)
    }

    /// All substances interacting with `name` in either direction
    #[must_use]
    pub fn neighbours(&self, name: &str) -> Vec<Interaction> {
        let Some(idx) = self.node(name) else {
            return Vec::new();
        };
        let mut others: Vec<NodeIndex> = self.graph.neighbors_undirected(idx).collect();
        others.sort_by_key(|n| n.index());
        others.dedup();

        let mut found: Vec<Interaction> = others
            .into_iter()
            .filter_map(|other| self.between(&self.graph[idx], &self.graph[other]))
            .collect();
        found.sort_by(|x, y| y.kind.cmp(&x.kind).then_with(|| x.to.cmp(&y.to)));
        found
    }

    /// Number of resolved edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// `candidate` beats `current`: more dangerous, or as dangerous and more specific
fn stronger(candidate: &InteractionEdge, current: &InteractionEdge) -> bool {
    candidate.kind > current.kind
        || (candidate.kind == current.kind
            && candidate.via.specificity() < current.via.specificity())
}

/// Lowercase, trimmed, without a plural `s`
fn normalize_class(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if stem.chars().count() >= 3 => stem.to_string(),
        _ => lower,
    }
}

fn class_names(substance: &Substance) -> HashSet<String> {
    substance
        .categories
        .iter()
        .chain(substance.chemical_class.iter())
        .chain(substance.psychoactive_class.iter())
        .map(String::as_str)
        .map(normalize_class)
        .collect()
}

/// Substances a listed name stands for
fn resolve(
    repo: &SubstanceRepo,
    classes: &[HashSet<String>],
    raw: &str,
) -> JournalResult<Vec<(usize, MatchKind)>> {
    let substances = repo.substances();

    if let Some(pos) = substances.iter().position(|s| s.is_named(raw)) {
        return Ok(vec![(pos, MatchKind::Direct)]);
    }

    let mut found = Vec::new();
    if raw.contains('x') {
        let matcher = wildcard(raw)?;
        found.extend(
            substances
                .iter()
                .enumerate()
                .filter(|(_, s)| matcher.is_match(&s.name))
                .map(|(i, _)| (i, MatchKind::Wildcard)),
        );
    }

    let class = normalize_class(raw);
    let by_class: Vec<(usize, MatchKind)> = classes
        .iter()
        .enumerate()
        .filter(|(i, set)| set.contains(&class) && !found.iter().any(|(f, _)| f == i))
        .map(|(i, _)| (i, MatchKind::Category))
        .collect();
    found.extend(by_class);
    Ok(found)
}

/// Compile a wiki wildcard: every run of lowercase `x` matches anything
fn wildcard(raw: &str) -> JournalResult<GlobMatcher> {
    let mut pattern = String::with_capacity(raw.len() + 4);
    let mut in_run = false;
    for c in raw.chars() {
        if c == 'x' {
            if !in_run {
                pattern.push('*');
            }
            in_run = true;
            continue;
        }
        in_run = false;
        match c {
            '*' | '?' | '[' | ']' | '{' | '}' => {
                pattern.push('[');
                pattern.push(c);
                pattern.push(']');
            }
            _ => pattern.push(c),
        }
    }

    let glob = GlobBuilder::new(&pattern)
        .case_insensitive(true)
        .literal_separator(false)
        .build()
        .map_err(|source| JournalError::Pattern {
            pattern: raw.to_string(),
            source,
        })?;
    Ok(glob.compile_matcher())
}
