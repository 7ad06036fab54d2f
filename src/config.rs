//! Build configuration.
//!
//! `BuildConfig` is the raw, user-editable configuration: every field has a
//! default so partial documents deserialize. `ResolvedBuildConfig` is what
//! the rest of the crate reads: charge counts clamped and mutually
//! exclusive life/mana/energy shield states settled.

use crate::context::QueryContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Charge settings for one charge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    pub enabled: bool,
    /// Requested count; `None` means "at maximum".
    pub count: Option<u32>,
    pub max: u32,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            count: None,
            max: 3,
        }
    }
}

impl ChargeConfig {
    /// Effective count: zero when disabled, otherwise clamped to `max`.
    pub fn resolve(&self) -> u32 {
        if !self.enabled {
            return 0;
        }
        self.count.unwrap_or(self.max).min(self.max)
    }
}

/// Enemy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub level: u32,
    pub is_boss: bool,
    pub fire_resist: f64,
    pub cold_resist: f64,
    pub lightning_resist: f64,
    pub chaos_resist: f64,
    pub armour: f64,
    pub evasion: f64,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            level: 84,
            is_boss: false,
            fire_resist: 0.0,
            cold_resist: 0.0,
            lightning_resist: 0.0,
            chaos_resist: 0.0,
            armour: 0.0,
            evasion: 0.0,
        }
    }
}

/// Raw build configuration as stored with a build.
///
/// ```rust
/// use modcalc::config::BuildConfig;
///
/// let config: BuildConfig = serde_json::from_str(
///     r#"{"power_charges": {"enabled": true, "count": 5}, "on_low_life": true, "on_full_life": true}"#,
/// ).unwrap();
/// let resolved = config.resolve();
///
/// assert_eq!(resolved.power_charges, 3);
/// assert!(resolved.low_life);
/// assert!(!resolved.full_life);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub power_charges: ChargeConfig,
    pub frenzy_charges: ChargeConfig,
    pub endurance_charges: ChargeConfig,
    pub on_low_life: bool,
    pub on_full_life: bool,
    pub on_low_mana: bool,
    pub on_full_mana: bool,
    pub on_low_energy_shield: bool,
    pub on_full_energy_shield: bool,
    pub enemy: EnemyConfig,
    /// Extra named conditions (`KilledRecently`, `Leeching`...).
    pub conditions: BTreeMap<String, bool>,
    /// Free-form modifier lines applied as configuration.
    pub custom_mods: Vec<String>,
}

/// Configuration after defaults and clamping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedBuildConfig {
    pub power_charges: u32,
    pub frenzy_charges: u32,
    pub endurance_charges: u32,
    pub low_life: bool,
    pub full_life: bool,
    pub low_mana: bool,
    pub full_mana: bool,
    pub low_energy_shield: bool,
    pub full_energy_shield: bool,
    pub enemy: EnemyConfig,
    pub conditions: BTreeMap<String, bool>,
    pub custom_mods: Vec<String>,
}

impl BuildConfig {
    pub fn resolve(&self) -> ResolvedBuildConfig {
        // Low wins over full
        let (low_life, full_life) = exclusive(self.on_low_life, self.on_full_life);
        let (low_mana, full_mana) = exclusive(self.on_low_mana, self.on_full_mana);
        let (low_energy_shield, full_energy_shield) =
            exclusive(self.on_low_energy_shield, self.on_full_energy_shield);
        ResolvedBuildConfig {
            power_charges: self.power_charges.resolve(),
            frenzy_charges: self.frenzy_charges.resolve(),
            endurance_charges: self.endurance_charges.resolve(),
            low_life,
            full_life,
            low_mana,
            full_mana,
            low_energy_shield,
            full_energy_shield,
            enemy: self.enemy.clone(),
            conditions: self.conditions.clone(),
            custom_mods: self.custom_mods.clone(),
        }
    }
}

fn exclusive(low: bool, full: bool) -> (bool, bool) {
    (low, full && !low)
}

impl ResolvedBuildConfig {
    /// Every condition this configuration sets, by name.
    pub fn condition_flags(&self) -> Vec<(String, bool)> {
        let mut flags: Vec<(String, bool)> = [
            ("LowLife", self.low_life),
            ("FullLife", self.full_life),
            ("LowMana", self.low_mana),
            ("FullMana", self.full_mana),
            ("LowEnergyShield", self.low_energy_shield),
            ("FullEnergyShield", self.full_energy_shield),
        ]
        .into_iter()
        .map(|(name, active)| (name.to_string(), active))
        .collect();
        flags.extend(self.conditions.iter().map(|(k, v)| (k.clone(), *v)));
        flags
    }

    /// Seed a query context with this configuration's conditions.
    pub fn apply_to(&self, ctx: &mut QueryContext) {
        for (name, active) in self.condition_flags() {
            ctx.set_condition(name, active);
        }
    }
}
