//! Query context for modifier aggregation.
//!
//! A `QueryContext` describes the situation a stat is being evaluated in:
//! which damage flags and skill keywords are in play, which boolean
//! conditions hold (`LowLife`, `Cursed`...), the current values of stats
//! that conditions may refer to, and the item slot being evaluated. The
//! store does not interpret any of it beyond the matching rules.

use crate::flags::{KeywordFlags, ModFlags};
use crate::stat_id::StatId;
use std::collections::HashMap;

/// Context information for store queries and stat resolution.
///
/// # Examples
///
/// ```rust
/// use modcalc::{QueryContext, ModFlags};
///
/// let ctx = QueryContext::new()
///     .with_flags(ModFlags::ATTACK | ModFlags::MELEE)
///     .with_condition("LowLife", true)
///     .with_stat_value("PowerCharges", 3.0);
///
/// assert!(ctx.condition("LowLife"));
/// assert!(!ctx.condition("FullLife"));
/// assert_eq!(ctx.stat_value(&"PowerCharges".into()), Some(3.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryContext {
    /// Damage-instance flags the query carries.
    pub flags: ModFlags,
    /// Skill keywords the query carries.
    pub keyword_flags: KeywordFlags,
    conditions: HashMap<String, bool>,
    stat_values: HashMap<StatId, f64>,
    /// Item slot being evaluated, for slot-local modifiers.
    pub slot: Option<String>,
}

impl QueryContext {
    /// Create an empty context: no flags, no conditions, no slot.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(mut self, flags: ModFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_keyword_flags(mut self, keyword_flags: KeywordFlags) -> Self {
        self.keyword_flags = keyword_flags;
        self
    }

    pub fn with_condition(mut self, name: impl Into<String>, active: bool) -> Self {
        self.set_condition(name, active);
        self
    }

    pub fn with_stat_value(mut self, stat: impl Into<StatId>, value: f64) -> Self {
        self.set_stat_value(stat, value);
        self
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Set a boolean condition.
    pub fn set_condition(&mut self, name: impl Into<String>, active: bool) {
        self.conditions.insert(name.into(), active);
    }

    /// Set the current value of a stat referenced by threshold or
    /// multiplier conditions.
    pub fn set_stat_value(&mut self, stat: impl Into<StatId>, value: f64) {
        self.stat_values.insert(stat.into(), value);
    }

    /// Whether a boolean condition holds. Unknown conditions are false.
    pub fn condition(&self, name: &str) -> bool {
        self.conditions.get(name).copied().unwrap_or(false)
    }

    /// The known value of a stat, if the context carries one.
    pub fn stat_value(&self, stat: &StatId) -> Option<f64> {
        self.stat_values.get(stat).copied()
    }

    /// Whether the context already carries a value for `stat`.
    pub fn has_stat_value(&self, stat: &StatId) -> bool {
        self.stat_values.contains_key(stat)
    }

    /// Active condition names, sorted.
    pub fn active_conditions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .conditions
            .iter()
            .filter(|(_, active)| **active)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
