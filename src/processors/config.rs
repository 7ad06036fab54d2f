//! Configuration and enemy stores.

use super::parse_into;
use crate::config::ResolvedBuildConfig;
use crate::modifier::{Mod, ModKind, ModSource, SourceCategory};
use crate::parser::{ModParser, ParseContext};
use crate::store::ModDb;

/// Charges, active condition flags and custom lines.
pub fn build_config_store(parser: &ModParser, config: &ResolvedBuildConfig) -> ModDb {
    let source = ModSource::new(SourceCategory::Config);
    let mut store = ModDb::new();
    for (stat, count) in [
        ("PowerCharges", config.power_charges),
        ("FrenzyCharges", config.frenzy_charges),
        ("EnduranceCharges", config.endurance_charges),
    ] {
        if count > 0 {
            store.add(Mod::new(stat, ModKind::Base, f64::from(count), source.clone()));
        }
    }
    for (name, active) in config.condition_flags() {
        if active {
            store.add(Mod::flag(format!("Condition:{name}"), source.clone()));
        }
    }
    parse_into(
        parser,
        &mut store,
        config.custom_mods.iter().map(String::as_str),
        &ParseContext::new(source),
    );
    store
}

/// The enemy's modifiers, from the enemy section of the configuration.
pub fn build_enemy_store(config: &ResolvedBuildConfig) -> ModDb {
    let source = ModSource::new(SourceCategory::Enemy);
    let enemy = &config.enemy;
    let mut store: ModDb = [
        ("Level", f64::from(enemy.level)),
        ("FireResist", enemy.fire_resist),
        ("ColdResist", enemy.cold_resist),
        ("LightningResist", enemy.lightning_resist),
        ("ChaosResist", enemy.chaos_resist),
        ("Armour", enemy.armour),
        ("Evasion", enemy.evasion),
    ]
    .into_iter()
    .map(|(stat, value)| Mod::new(stat, ModKind::Base, value, source.clone()))
    .collect();
    if enemy.is_boss {
        store.add(Mod::flag("Condition:Boss", source));
    }
    store
}
