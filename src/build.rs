//! Build specification.
//!
//! A `BuildSpec` is the complete player input the environment is computed
//! from: class, allocated passives, socketed jewels, equipped items for
//! both weapon sets, skill groups and configuration.

use crate::config::BuildConfig;
use crate::tree::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Weapon set an item slot belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum WeaponSet {
    #[default]
    First,
    Second,
}

impl WeaponSet {
    pub const ALL: [WeaponSet; 2] = [WeaponSet::First, WeaponSet::Second];

    pub fn index(self) -> usize {
        match self {
            WeaponSet::First => 0,
            WeaponSet::Second => 1,
        }
    }
}

/// An item slot in one weapon set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub weapon_set: WeaponSet,
    pub slot: String,
}

impl SlotKey {
    pub fn new(weapon_set: WeaponSet, slot: impl Into<String>) -> Self {
        Self {
            weapon_set,
            slot: slot.into(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.weapon_set {
            WeaponSet::First => f.write_str(&self.slot),
            WeaponSet::Second => write!(f, "{} (swap)", self.slot),
        }
    }
}

/// An equipped item or socketed jewel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub base_type: String,
    pub implicits: Vec<String>,
    pub explicits: Vec<String>,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_implicit(mut self, line: impl Into<String>) -> Self {
        self.implicits.push(line.into());
        self
    }

    pub fn with_explicit(mut self, line: impl Into<String>) -> Self {
        self.explicits.push(line.into());
        self
    }

    /// Implicit lines followed by explicit lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.implicits
            .iter()
            .chain(&self.explicits)
            .map(String::as_str)
    }
}

/// A gem in a skill group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gem {
    pub name: String,
    pub level: u32,
    pub quality: u32,
    pub enabled: bool,
    /// Stat lines the gem grants at its level.
    pub stats: Vec<String>,
}

impl Default for Gem {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: 20,
            quality: 0,
            enabled: true,
            stats: Vec::new(),
        }
    }
}

impl Gem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A linked group of gems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillGroup {
    pub label: String,
    pub enabled: bool,
    pub slot: Option<String>,
    pub gems: Vec<Gem>,
}

impl Default for SkillGroup {
    fn default() -> Self {
        Self {
            label: String::new(),
            enabled: true,
            slot: None,
            gems: Vec::new(),
        }
    }
}

/// Everything a build consists of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSpec {
    pub class: String,
    pub ascendancy: Option<String>,
    pub level: u32,
    pub allocated_nodes: BTreeSet<NodeId>,
    /// Mastery node id to chosen effect id.
    pub mastery_selections: BTreeMap<NodeId, u32>,
    /// Jewel socket node id to socketed jewel.
    pub jewels: BTreeMap<NodeId, Item>,
    /// Equipped items by slot name, one map per weapon set.
    pub items: [BTreeMap<String, Item>; 2],
    pub active_weapon_set: WeaponSet,
    pub skill_groups: Vec<SkillGroup>,
    pub config: BuildConfig,
}

impl BuildSpec {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            level: 1,
            ..Self::default()
        }
    }

    pub fn item(&self, key: &SlotKey) -> Option<&Item> {
        self.items[key.weapon_set.index()].get(&key.slot)
    }

    /// Equip or clear a slot.
    pub fn set_item(&mut self, key: &SlotKey, item: Option<Item>) {
        let set = &mut self.items[key.weapon_set.index()];
        match item {
            Some(item) => {
                set.insert(key.slot.clone(), item);
            }
            None => {
                set.remove(&key.slot);
            }
        }
    }

    /// Every occupied slot of both weapon sets, in order.
    pub fn slot_keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        WeaponSet::ALL.into_iter().flat_map(move |set| {
            self.items[set.index()]
                .keys()
                .map(move |slot| SlotKey::new(set, slot.clone()))
        })
    }
}
