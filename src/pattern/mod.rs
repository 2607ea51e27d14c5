use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PATTERN: &str = "4-4-4-4";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    Inhale,
    Hold,
    Exhale,
}

impl PhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Inhale => "Inhale",
            PhaseKind::Hold => "Hold",
            PhaseKind::Exhale => "Exhale",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub kind: PhaseKind,
    /// Seconds, always positive for phases inside a [`Pattern`].
    pub duration: f64,
}

impl Phase {
    pub const fn new(kind: PhaseKind, duration: f64) -> Self {
        Self { kind, duration }
    }
}

/// Named, ordered sequence of phases repeated as a cycle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    id: String,
    phases: Vec<Phase>,
}

impl Pattern {
    pub fn new(id: impl Into<String>, phases: Vec<Phase>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            bail!("pattern id must not be empty");
        }
        if phases.is_empty() {
            bail!("pattern '{id}' has no phases");
        }
        if let Some((index, phase)) = phases
            .iter()
            .enumerate()
            .find(|(_, phase)| !(phase.duration.is_finite() && phase.duration > 0.0))
        {
            bail!(
                "pattern '{id}' phase {index} ({}) has invalid duration {}",
                phase.kind,
                phase.duration
            );
        }
        Ok(Self { id, phases })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// Length of one full cycle in seconds.
    pub fn total_duration(&self) -> f64 {
        self.phases.iter().map(|phase| phase.duration).sum()
    }

    /// Seconds spent in the phases before `index` within one cycle.
    pub fn elapsed_before(&self, index: usize) -> f64 {
        self.phases
            .iter()
            .take(index)
            .map(|phase| phase.duration)
            .sum()
    }

    pub fn breaths_per_minute(&self) -> f64 {
        60.0 / self.total_duration()
    }
}

/// User-defined pattern as it appears in the settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatternDef {
    pub id: String,
    pub phases: Vec<Phase>,
}

impl TryFrom<PatternDef> for Pattern {
    type Error = anyhow::Error;

    fn try_from(def: PatternDef) -> Result<Self> {
        Pattern::new(def.id, def.phases)
    }
}

fn builtin(id: &str, phases: &[(PhaseKind, f64)]) -> Pattern {
    Pattern {
        id: id.to_string(),
        phases: phases
            .iter()
            .map(|&(kind, duration)| Phase::new(kind, duration))
            .collect(),
    }
}

/// Lookup table of every pattern the pacer can run. Built-ins come first.
#[derive(Debug, Clone)]
pub struct PatternTable {
    patterns: Vec<Pattern>,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternTable {
    pub fn builtin() -> Self {
        use PhaseKind::{Exhale, Hold, Inhale};

        Self {
            patterns: vec![
                builtin("4-7-8", &[(Inhale, 4.0), (Hold, 7.0), (Exhale, 8.0)]),
                builtin(
                    "4-4-4-4",
                    &[(Inhale, 4.0), (Hold, 4.0), (Exhale, 4.0), (Hold, 4.0)],
                ),
                builtin("5-5-5", &[(Inhale, 5.0), (Hold, 5.0), (Exhale, 5.0)]),
            ],
        }
    }

    /// Adds user-defined patterns. A custom id equal to a built-in replaces it in place.
    pub fn with_custom(mut self, defs: impl IntoIterator<Item = PatternDef>) -> Result<Self> {
        for def in defs {
            let pattern = Pattern::try_from(def)?;
            match self.patterns.iter_mut().find(|p| p.id == pattern.id) {
                Some(existing) => *existing = pattern,
                None => self.patterns.push(pattern),
            }
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|pattern| pattern.id == name)
    }

    pub fn lookup(&self, name: &str) -> Result<&Pattern> {
        self.get(name).ok_or_else(|| {
            anyhow!(
                "unknown pattern '{name}' (available: {})",
                self.names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    /// Falls back to [`DEFAULT_PATTERN`] when `name` is not in the table.
    pub fn get_or_default(&self, name: &str) -> &Pattern {
        self.get(name)
            .or_else(|| self.get(DEFAULT_PATTERN))
            .unwrap_or(&self.patterns[0])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|pattern| pattern.id.as_str())
    }

    pub fn nth_name(&self, index: usize) -> Option<&str> {
        self.patterns.get(index).map(|pattern| pattern.id.as_str())
    }

    /// Next pattern id in table order, wrapping around.
    pub fn next_after(&self, name: &str) -> &str {
        let next = self
            .patterns
            .iter()
            .position(|pattern| pattern.id == name)
            .map_or(0, |index| (index + 1) % self.patterns.len());
        &self.patterns[next].id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
