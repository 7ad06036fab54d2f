//! Modifier records.
//!
//! A `Mod` is a single structured stat modification produced by the parser
//! or a category processor: a target stat, an aggregation kind, a value,
//! applicability filters and its provenance.

use crate::context::QueryContext;
use crate::flags::{KeywordFlags, ModFlags};
use crate::stat_id::StatId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a modifier combines with others targeting the same stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModKind {
    /// Added to the base value.
    Base,
    /// Summed with other increases/reductions, applied as `1 + sum`.
    Inc,
    /// Each applied as a separate `1 + value` factor.
    More,
    /// Replaces the computed value.
    Override,
    /// Boolean switch.
    Flag,
    /// Collected, not aggregated.
    List,
}

impl fmt::Display for ModKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModKind::Base => "BASE",
            ModKind::Inc => "INC",
            ModKind::More => "MORE",
            ModKind::Override => "OVERRIDE",
            ModKind::Flag => "FLAG",
            ModKind::List => "LIST",
        };
        f.write_str(s)
    }
}

/// Modifier payload. INC and MORE numbers are fractions (`0.1` is 10%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModValue {
    Number(f64),
    Flag(bool),
    List(String),
}

impl ModValue {
    /// Numeric view of the value: flags count as 0/1, lists as 0.
    pub fn as_number(&self) -> f64 {
        match self {
            ModValue::Number(v) => *v,
            ModValue::Flag(true) => 1.0,
            ModValue::Flag(false) | ModValue::List(_) => 0.0,
        }
    }
}

/// Input category a modifier came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum SourceCategory {
    /// Class starting attributes.
    Class,
    Passive,
    Jewel,
    Item,
    Skill,
    Config,
    Enemy,
    /// Anything without a more specific origin.
    #[default]
    Custom,
}

/// Provenance of a modifier: its category plus an optional instance id
/// (node id, item id, socket id, gem name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModSource {
    pub category: SourceCategory,
    pub id: Option<String>,
}

impl ModSource {
    pub fn new(category: SourceCategory) -> Self {
        Self { category, id: None }
    }

    pub fn with_id(category: SourceCategory, id: impl Into<String>) -> Self {
        Self {
            category,
            id: Some(id.into()),
        }
    }

    /// Whether this source matches a `(category, id)` removal/filter key.
    /// A `None` id matches every instance of the category.
    pub fn matches(&self, category: SourceCategory, id: Option<&str>) -> bool {
        self.category == category && id.map_or(true, |id| self.id.as_deref() == Some(id))
    }
}

impl fmt::Display for ModSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{:?}:{}", self.category, id),
            None => write!(f, "{:?}", self.category),
        }
    }
}

/// Predicate gating a modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// A boolean state such as `LowLife`.
    Flag {
        var: String,
        #[serde(default)]
        negated: bool,
    },
    /// A comparison against the current value of another stat.
    StatThreshold {
        stat: StatId,
        threshold: f64,
        #[serde(default = "default_at_least")]
        at_least: bool,
    },
    /// Scales the modifier by `floor(stat / per)`, optionally capped.
    Multiplier {
        stat: StatId,
        #[serde(default = "default_per")]
        per: f64,
        #[serde(default)]
        limit: Option<f64>,
    },
}

fn default_at_least() -> bool {
    true
}

fn default_per() -> f64 {
    1.0
}

impl Condition {
    /// Evaluate against a context. Returns the factor the modifier value is
    /// scaled by, or `None` when the modifier does not apply.
    pub fn factor(&self, ctx: &QueryContext) -> Option<f64> {
        match self {
            Condition::Flag { var, negated } => (ctx.condition(var) != *negated).then_some(1.0),
            Condition::StatThreshold {
                stat,
                threshold,
                at_least,
            } => {
                let value = ctx.stat_value(stat).unwrap_or(0.0);
                let holds = if *at_least {
                    value >= *threshold
                } else {
                    value < *threshold
                };
                holds.then_some(1.0)
            }
            Condition::Multiplier { stat, per, limit } => {
                let count = ctx.stat_value(stat).unwrap_or(0.0);
                let mut factor = if *per > 0.0 {
                    (count / per).floor()
                } else {
                    count
                };
                if let Some(limit) = limit {
                    factor = factor.min(*limit);
                }
                (factor > 0.0).then_some(factor)
            }
        }
    }

    /// The stat whose value this condition reads, if any.
    pub fn referenced_stat(&self) -> Option<&StatId> {
        match self {
            Condition::Flag { .. } => None,
            Condition::StatThreshold { stat, .. } | Condition::Multiplier { stat, .. } => Some(stat),
        }
    }
}

/// Extra annotation on a modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModTag {
    /// Applies only when the query is evaluating this item slot.
    SlotName(String),
    /// Free-form label, ignored by matching.
    Label(String),
}

/// A single stat modification.
///
/// # Examples
///
/// ```rust
/// use modcalc::{Mod, ModKind, ModSource, SourceCategory, QueryContext, ModFlags};
///
/// let m = Mod::new("Damage", ModKind::Inc, 0.2, ModSource::new(SourceCategory::Passive))
///     .with_flags(ModFlags::ATTACK);
///
/// assert_eq!(m.applies(&QueryContext::new()), None);
/// assert_eq!(m.applies(&QueryContext::new().with_flags(ModFlags::ATTACK)), Some(0.2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mod {
    pub name: StatId,
    pub kind: ModKind,
    pub value: ModValue,
    #[serde(default)]
    pub flags: ModFlags,
    #[serde(default)]
    pub keyword_flags: KeywordFlags,
    #[serde(default)]
    pub source: ModSource,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub tag: Option<ModTag>,
}

impl Mod {
    /// A numeric modifier with no filters.
    pub fn new(name: impl Into<StatId>, kind: ModKind, value: f64, source: ModSource) -> Self {
        Self {
            name: name.into(),
            kind,
            value: ModValue::Number(value),
            flags: ModFlags::empty(),
            keyword_flags: KeywordFlags::empty(),
            source,
            condition: None,
            tag: None,
        }
    }

    /// A FLAG modifier set to true.
    pub fn flag(name: impl Into<StatId>, source: ModSource) -> Self {
        Self {
            value: ModValue::Flag(true),
            ..Self::new(name, ModKind::Flag, 0.0, source)
        }
    }

    /// A LIST modifier carrying a text entry.
    pub fn list(name: impl Into<StatId>, entry: impl Into<String>, source: ModSource) -> Self {
        Self {
            value: ModValue::List(entry.into()),
            ..Self::new(name, ModKind::List, 0.0, source)
        }
    }

    pub fn with_flags(mut self, flags: ModFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_keyword_flags(mut self, keyword_flags: KeywordFlags) -> Self {
        self.keyword_flags = keyword_flags;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_tag(mut self, tag: ModTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Match this modifier against a query. Returns the effective numeric
    /// value (scaled by a multiplier condition) when it applies.
    pub fn applies(&self, ctx: &QueryContext) -> Option<f64> {
        if !self.flags.applies_to(ctx.flags) || !self.keyword_flags.applies_to(ctx.keyword_flags) {
            return None;
        }
        if let Some(ModTag::SlotName(slot)) = &self.tag {
            if ctx.slot.as_deref() != Some(slot.as_str()) {
                return None;
            }
        }
        let factor = match &self.condition {
            Some(condition) => condition.factor(ctx)?,
            None => 1.0,
        };
        Some(self.value.as_number() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passive() -> ModSource {
        ModSource::with_id(SourceCategory::Passive, "1234")
    }

    #[test]
    fn test_flag_condition() {
        let m = Mod::new("Life", ModKind::Inc, 0.1, passive()).with_condition(Condition::Flag {
            var: "LowLife".into(),
            negated: false,
        });
        assert_eq!(m.applies(&QueryContext::new()), None);
        let ctx = QueryContext::new().with_condition("LowLife", true);
        assert_eq!(m.applies(&ctx), Some(0.1));
    }

    #[test]
    fn test_negated_flag_condition() {
        let cond = Condition::Flag {
            var: "Cursed".into(),
            negated: true,
        };
        assert_eq!(cond.factor(&QueryContext::new()), Some(1.0));
        assert_eq!(
            cond.factor(&QueryContext::new().with_condition("Cursed", true)),
            None
        );
    }

    #[test]
    fn test_multiplier_condition_scales_and_caps() {
        let cond = Condition::Multiplier {
            stat: "Strength".into(),
            per: 10.0,
            limit: Some(5.0),
        };
        let ctx = QueryContext::new().with_stat_value("Strength", 37.0);
        assert_eq!(cond.factor(&ctx), Some(3.0));
        let ctx = QueryContext::new().with_stat_value("Strength", 500.0);
        assert_eq!(cond.factor(&ctx), Some(5.0));
        assert_eq!(cond.factor(&QueryContext::new()), None);
    }

    #[test]
    fn test_threshold_condition() {
        let cond = Condition::StatThreshold {
            stat: "Dexterity".into(),
            threshold: 200.0,
            at_least: true,
        };
        assert_eq!(cond.factor(&QueryContext::new().with_stat_value("Dexterity", 199.0)), None);
        assert_eq!(
            cond.factor(&QueryContext::new().with_stat_value("Dexterity", 200.0)),
            Some(1.0)
        );
    }

    #[test]
    fn test_slot_tag_requires_matching_slot() {
        let m = Mod::new("PhysicalDamageMin", ModKind::Base, 5.0, passive())
            .with_tag(ModTag::SlotName("Weapon 1".into()));
        assert_eq!(m.applies(&QueryContext::new()), None);
        assert_eq!(m.applies(&QueryContext::new().with_slot("Weapon 2")), None);
        assert_eq!(m.applies(&QueryContext::new().with_slot("Weapon 1")), Some(5.0));
    }

    #[test]
    fn test_source_matching() {
        let src = passive();
        assert!(src.matches(SourceCategory::Passive, None));
        assert!(src.matches(SourceCategory::Passive, Some("1234")));
        assert!(!src.matches(SourceCategory::Passive, Some("99")));
        assert!(!src.matches(SourceCategory::Item, None));
    }
}
