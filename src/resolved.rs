//! Resolved stat results module.
//!
//! Contains the `ResolvedStat` type: a final stat value plus the breakdown
//! of every modifier and attribute bonus that produced it.

use crate::modifier::ModKind;
use crate::stat_id::StatId;
use serde::Serialize;

/// One labelled contribution to a resolved stat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    /// Where the contribution came from (`Item:helm`, `Strength`, ...).
    pub label: String,
    pub kind: ModKind,
    /// The effective value contributed (INC/MORE as fractions).
    pub value: f64,
}

/// A resolved stat value with full breakdown information.
///
/// # Examples
///
/// ```rust
/// use modcalc::{ModKind, ResolvedStat, StatId};
///
/// let mut resolved = ResolvedStat::new(StatId::new("Life"));
/// resolved.add_source("Item:helm", ModKind::Base, 60.0);
/// resolved.add_source("Strength", ModKind::Base, 40.0);
///
/// assert_eq!(resolved.sources.len(), 2);
/// assert_eq!(resolved.entries_of(ModKind::Base).count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStat {
    pub stat_id: StatId,

    /// The final value.
    pub value: f64,

    /// Total BASE, including attribute bonuses.
    pub base: f64,

    /// Total INC as a fraction, including attribute bonuses.
    pub inc: f64,

    /// Product of all MORE factors.
    pub more: f64,

    /// Set when an OVERRIDE decided the value.
    pub override_value: Option<f64>,

    /// Contributions in the order they were collected.
    pub sources: Vec<BreakdownEntry>,
}

impl ResolvedStat {
    /// An empty result: value 0, neutral multipliers.
    pub fn new(stat_id: StatId) -> Self {
        Self {
            stat_id,
            value: 0.0,
            base: 0.0,
            inc: 0.0,
            more: 1.0,
            override_value: None,
            sources: Vec::new(),
        }
    }

    /// Add a contribution to the breakdown.
    pub fn add_source(&mut self, label: impl Into<String>, kind: ModKind, value: f64) {
        self.sources.push(BreakdownEntry {
            label: label.into(),
            kind,
            value,
        });
    }

    /// Breakdown entries of one kind.
    pub fn entries_of(&self, kind: ModKind) -> impl Iterator<Item = &BreakdownEntry> {
        self.sources.iter().filter(move |e| e.kind == kind)
    }

    /// Whether an OVERRIDE decided the value.
    pub fn is_overridden(&self) -> bool {
        self.override_value.is_some()
    }
}
