//! Attribute dependency rules.
//!
//! Core attributes grant bonuses to other stats: every two points of
//! Strength give one maximum Life, every five points of Intelligence give
//! 1% increased Energy Shield, and so on. The table is fixed game data.

use crate::flags::ModFlags;
use crate::modifier::ModKind;

/// One attribute-to-stat bonus rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeRule {
    pub source: &'static str,
    pub target: &'static str,
    /// `ModKind::Base` or `ModKind::Inc` (INC multipliers are fractions).
    pub kind: ModKind,
    pub multiplier: f64,
    pub divisor: Option<u32>,
    /// Query flags required for the rule to apply.
    pub flags: ModFlags,
}

impl AttributeRule {
    /// Bonus granted for an attribute value. Non-positive attributes grant
    /// nothing; only the divided value is floored.
    pub fn contribution(&self, attribute: f64) -> f64 {
        if attribute <= 0.0 {
            return 0.0;
        }
        match self.divisor {
            Some(d) if d > 0 => (attribute / f64::from(d)).floor() * self.multiplier,
            _ => attribute * self.multiplier,
        }
    }
}

pub const STRENGTH: &str = "Strength";
pub const DEXTERITY: &str = "Dexterity";
pub const INTELLIGENCE: &str = "Intelligence";

pub const ATTRIBUTE_RULES: &[AttributeRule] = &[
    AttributeRule {
        source: STRENGTH,
        target: "Life",
        kind: ModKind::Base,
        multiplier: 1.0,
        divisor: Some(2),
        flags: ModFlags::empty(),
    },
    AttributeRule {
        source: STRENGTH,
        target: "PhysicalDamage",
        kind: ModKind::Inc,
        multiplier: 0.01,
        divisor: Some(5),
        flags: ModFlags::MELEE,
    },
    AttributeRule {
        source: DEXTERITY,
        target: "Accuracy",
        kind: ModKind::Base,
        multiplier: 2.0,
        divisor: None,
        flags: ModFlags::empty(),
    },
    AttributeRule {
        source: DEXTERITY,
        target: "Evasion",
        kind: ModKind::Inc,
        multiplier: 0.01,
        divisor: Some(5),
        flags: ModFlags::empty(),
    },
    AttributeRule {
        source: INTELLIGENCE,
        target: "Mana",
        kind: ModKind::Base,
        multiplier: 1.0,
        divisor: Some(2),
        flags: ModFlags::empty(),
    },
    AttributeRule {
        source: INTELLIGENCE,
        target: "EnergyShield",
        kind: ModKind::Inc,
        multiplier: 0.01,
        divisor: Some(5),
        flags: ModFlags::empty(),
    },
];

/// Rules that feed `target`.
pub fn rules_for(target: &str) -> impl Iterator<Item = &'static AttributeRule> + '_ {
    ATTRIBUTE_RULES.iter().filter(move |r| r.target == target)
}

/// Resolved core attributes of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct Attributes {
    pub strength: f64,
    pub dexterity: f64,
    pub intelligence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_floors() {
        let life = rules_for("Life").next().unwrap();
        assert_eq!(life.contribution(101.0), 50.0);
        assert_eq!(life.contribution(1.0), 0.0);
    }

    #[test]
    fn test_non_positive_attribute_contributes_nothing() {
        let accuracy = rules_for("Accuracy").next().unwrap();
        assert_eq!(accuracy.contribution(0.0), 0.0);
        assert_eq!(accuracy.contribution(-20.0), 0.0);
        assert_eq!(accuracy.contribution(15.0), 30.0);
    }

    #[test]
    fn test_no_divisor_keeps_fraction() {
        let accuracy = rules_for("Accuracy").next().unwrap();
        assert_eq!(accuracy.divisor, None);
        assert_eq!(accuracy.contribution(10.5), 21.0);
    }

    #[test]
    fn test_inc_rule_is_fraction() {
        let es = rules_for("EnergyShield").next().unwrap();
        assert_eq!(es.kind, ModKind::Inc);
        assert!((es.contribution(52.0) - 0.10).abs() < 1e-9);
    }
}
