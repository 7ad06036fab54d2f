//! Dirty flags and change detection.

use crate::build::{BuildSpec, SlotKey};
use crate::tree::NodeId;
use std::collections::BTreeSet;

/// Which members of a keyed category changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtySet<K: Ord> {
    Clean,
    /// Every member, known or not.
    AllDirty,
    Specific(BTreeSet<K>),
}

impl<K: Ord> Default for DirtySet<K> {
    fn default() -> Self {
        DirtySet::Clean
    }
}

impl<K: Ord + Clone> DirtySet<K> {
    /// `Clean` when `changed` is empty.
    pub fn from_changes(changed: impl IntoIterator<Item = K>) -> Self {
        let set: BTreeSet<K> = changed.into_iter().collect();
        if set.is_empty() {
            DirtySet::Clean
        } else {
            DirtySet::Specific(set)
        }
    }

    pub fn is_clean(&self) -> bool {
        match self {
            DirtySet::Clean => true,
            DirtySet::AllDirty => false,
            DirtySet::Specific(set) => set.is_empty(),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match self {
            DirtySet::Clean => false,
            DirtySet::AllDirty => true,
            DirtySet::Specific(set) => set.contains(key),
        }
    }

    pub fn mark(&mut self, key: K) {
        match self {
            DirtySet::AllDirty => {}
            DirtySet::Specific(set) => {
                set.insert(key);
            }
            DirtySet::Clean => *self = DirtySet::Specific(BTreeSet::from([key])),
        }
    }

    pub fn mark_all(&mut self) {
        *self = DirtySet::AllDirty;
    }
}

/// Categories that need rebuilding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub passives: bool,
    pub jewels: DirtySet<NodeId>,
    pub items: DirtySet<SlotKey>,
    pub skills: bool,
    pub config: bool,
    /// The active weapon set switched; only the flattened store changes.
    pub weapon_set: bool,
}

impl DirtyFlags {
    /// Everything dirty.
    pub fn all() -> Self {
        Self {
            passives: true,
            jewels: DirtySet::AllDirty,
            items: DirtySet::AllDirty,
            skills: true,
            config: true,
            weapon_set: true,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.passives
            && self.jewels.is_clean()
            && self.items.is_clean()
            && !self.skills
            && !self.config
            && !self.weapon_set
    }
}

/// Compare two build snapshots.
///
/// ```rust
/// use modcalc::build::{BuildSpec, Item, SlotKey, WeaponSet};
/// use modcalc::environment::dirty::{detect_changes, DirtySet};
///
/// let old = BuildSpec::new("Witch");
/// let mut new = old.clone();
/// let ring = SlotKey::new(WeaponSet::First, "Ring 1");
/// new.set_item(&ring, Some(Item::new("ring")));
///
/// let dirty = detect_changes(&old, &new);
/// assert!(dirty.items.contains(&ring));
/// assert!(!dirty.passives && !dirty.skills && !dirty.config);
/// assert!(detect_changes(&new, &new).is_clean());
/// ```
pub fn detect_changes(old: &BuildSpec, new: &BuildSpec) -> DirtyFlags {
    let passives = old.class != new.class
        || old.ascendancy != new.ascendancy
        || old.allocated_nodes != new.allocated_nodes
        || old.mastery_selections != new.mastery_selections;

    let sockets: BTreeSet<NodeId> = old.jewels.keys().chain(new.jewels.keys()).copied().collect();
    let jewels = DirtySet::from_changes(
        sockets
            .into_iter()
            .filter(|s| old.jewels.get(s) != new.jewels.get(s)),
    );

    let slots: BTreeSet<SlotKey> = old.slot_keys().chain(new.slot_keys()).collect();
    let items = DirtySet::from_changes(
        slots
            .into_iter()
            .filter(|key| old.item(key) != new.item(key)),
    );

    DirtyFlags {
        passives,
        jewels,
        items,
        skills: old.skill_groups != new.skill_groups,
        config: old.config != new.config,
        weapon_set: old.active_weapon_set != new.active_weapon_set,
    }
}
