//! Environment assembly.
//!
//! An [`Environment`] is the computed state of one build snapshot: a store
//! per input category, the flattened player store composed from them, the
//! enemy store, derived attributes and the resolved configuration. All
//! stores are shared through `Arc`, so an incremental rebuild that leaves
//! a category alone hands the previous store on untouched (pointer-equal).
//!
//! Every call that produces an environment from a previous one bumps the
//! version by exactly one.

pub mod dirty;

use crate::attributes::{Attributes, DEXTERITY, INTELLIGENCE, STRENGTH};
use crate::build::{BuildSpec, Item, SlotKey};
use crate::config::ResolvedBuildConfig;
use crate::context::QueryContext;
use crate::conversion::ConversionTable;
use crate::parser::ModParser;
use crate::processors::{config, items, passives, skills};
use crate::resolver::StatResolver;
use crate::store::ModDb;
use crate::tree::{NodeId, PassiveTree};
use dirty::{detect_changes, DirtyFlags, DirtySet};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Computed state of a build.
#[derive(Debug, Clone)]
pub struct Environment {
    pub version: u64,
    /// Flattened player store.
    pub player: Arc<ModDb>,
    pub enemy: Arc<ModDb>,
    /// Passives, class attributes and jewels.
    pub passives: Arc<ModDb>,
    /// One store per occupied slot of both weapon sets.
    pub items: BTreeMap<SlotKey, Arc<ModDb>>,
    pub skills: Arc<ModDb>,
    pub config: Arc<ModDb>,
    pub attributes: Attributes,
    pub build: BuildSpec,
    pub resolved_config: ResolvedBuildConfig,
    /// Flags that produced this environment.
    pub dirty: DirtyFlags,
}

impl Environment {
    /// Query context carrying the configuration's conditions.
    pub fn query_context(&self) -> QueryContext {
        let mut ctx = QueryContext::new();
        self.resolved_config.apply_to(&mut ctx);
        ctx
    }

    /// A resolver over the flattened player store.
    pub fn resolver(&self) -> StatResolver {
        StatResolver::new(Arc::clone(&self.player)).with_context(self.query_context())
    }

    /// Damage conversion tables from the player store.
    pub fn conversion_table(&self) -> ConversionTable {
        ConversionTable::from_store(&self.player, &self.query_context())
    }
}

/// Hints for [`EnvironmentBuilder::setup`].
pub struct Acceleration<'a> {
    pub previous: &'a Environment,
    /// Known changes. `None` compares the build against the previous one.
    pub dirty: Option<DirtyFlags>,
}

/// Category stores of an environment under construction.
struct Stores {
    passives: Arc<ModDb>,
    items: BTreeMap<SlotKey, Arc<ModDb>>,
    skills: Arc<ModDb>,
    config: Arc<ModDb>,
    enemy: Arc<ModDb>,
}

impl Stores {
    fn from_previous(previous: &Environment) -> Self {
        Self {
            passives: Arc::clone(&previous.passives),
            items: previous.items.clone(),
            skills: Arc::clone(&previous.skills),
            config: Arc::clone(&previous.config),
            enemy: Arc::clone(&previous.enemy),
        }
    }
}

/// Builds environments from build specifications.
///
/// # Examples
///
/// ```rust
/// use modcalc::build::BuildSpec;
/// use modcalc::environment::EnvironmentBuilder;
/// use modcalc::parser::{ModParser, tables::ParserTables};
/// use modcalc::tree::{ClassStart, InMemoryTree};
///
/// let parser = ModParser::new(ParserTables::builtin().unwrap()).unwrap();
/// let tree = InMemoryTree::new().with_class(
///     "Marauder",
///     ClassStart { strength: 32.0, dexterity: 14.0, intelligence: 14.0 },
/// );
/// let builder = EnvironmentBuilder::new(&parser, &tree);
///
/// let env = builder.build_full(&BuildSpec::new("Marauder"), None);
/// assert_eq!(env.version, 1);
/// assert_eq!(env.attributes.strength, 32.0);
/// assert_eq!(env.resolver().value("Life"), 16.0);
/// ```
pub struct EnvironmentBuilder<'a> {
    parser: &'a ModParser,
    tree: &'a dyn PassiveTree,
}

impl<'a> EnvironmentBuilder<'a> {
    pub fn new(parser: &'a ModParser, tree: &'a dyn PassiveTree) -> Self {
        Self { parser, tree }
    }

    /// Build an environment, incrementally when a previous one is given.
    pub fn setup(&self, build: &BuildSpec, acceleration: Option<Acceleration<'_>>) -> Environment {
        match acceleration {
            None => self.build_full(build, None),
            Some(Acceleration { previous, dirty }) => {
                let dirty = dirty.unwrap_or_else(|| detect_changes(&previous.build, build));
                self.build_accelerated(build, previous, &dirty)
            }
        }
    }

    /// Build every category store from scratch.
    pub fn build_full(&self, build: &BuildSpec, previous: Option<&Environment>) -> Environment {
        let resolved = build.config.resolve();
        let stores = Stores {
            passives: self.passive_store(build),
            items: self.item_stores(build),
            skills: Arc::new(skills::build_skill_store(self.parser, build)),
            config: Arc::new(config::build_config_store(self.parser, &resolved)),
            enemy: Arc::new(config::build_enemy_store(&resolved)),
        };
        let version = previous.map_or(1, |p| p.version + 1);
        debug!(version, "full environment build");
        self.assemble(build.clone(), resolved, stores, version, DirtyFlags::all())
    }

    /// Rebuild only the categories `dirty` names; reuse the rest.
    ///
    /// # Arguments
    ///
    /// * `build` - The new build
    /// * `previous` - Environment whose clean stores are reused
    /// * `dirty` - Categories to rebuild
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modcalc::build::{BuildSpec, Item, SlotKey, WeaponSet};
    /// use modcalc::environment::{dirty::DirtyFlags, EnvironmentBuilder};
    /// use modcalc::parser::{ModParser, tables::ParserTables};
    /// use modcalc::tree::InMemoryTree;
    /// use std::sync::Arc;
    ///
    /// let parser = ModParser::new(ParserTables::builtin().unwrap()).unwrap();
    /// let tree = InMemoryTree::new();
    /// let builder = EnvironmentBuilder::new(&parser, &tree);
    /// let helmet = SlotKey::new(WeaponSet::First, "Helmet");
    ///
    /// let mut build = BuildSpec::new("Witch");
    /// let first = builder.build_full(&build, None);
    ///
    /// build.set_item(&helmet, Some(Item::new("hood").with_explicit("+30 to maximum Life")));
    /// let mut dirty = DirtyFlags::default();
    /// dirty.items.mark(helmet.clone());
    /// let second = builder.build_accelerated(&build, &first, &dirty);
    ///
    /// assert_eq!(second.version, 2);
    /// assert_eq!(second.resolver().value("Life"), 30.0);
    /// assert!(Arc::ptr_eq(&first.passives, &second.passives));
    /// ```
    pub fn build_accelerated(
        &self,
        build: &BuildSpec,
        previous: &Environment,
        dirty: &DirtyFlags,
    ) -> Environment {
        let version = previous.version + 1;
        if dirty.is_clean() {
            debug!(version, "no dirty categories; reusing environment");
            return Environment {
                version,
                dirty: DirtyFlags::default(),
                ..previous.clone()
            };
        }

        let mut stores = Stores::from_previous(previous);
        let resolved = if dirty.config {
            let resolved = build.config.resolve();
            stores.config = Arc::new(config::build_config_store(self.parser, &resolved));
            stores.enemy = Arc::new(config::build_enemy_store(&resolved));
            resolved
        } else {
            previous.resolved_config.clone()
        };

        // Jewels live in the passive store, which is always rebuilt whole so
        // its insertion order matches a full build.
        if dirty.passives || !dirty.jewels.is_clean() {
            stores.passives = self.passive_store(build);
        }

        match &dirty.items {
            DirtySet::Clean => {}
            DirtySet::AllDirty => stores.items = self.item_stores(build),
            DirtySet::Specific(keys) => {
                for key in keys {
                    self.refresh_slot(build, key, &mut stores.items);
                }
            }
        }

        if dirty.skills {
            stores.skills = Arc::new(skills::build_skill_store(self.parser, build));
        }

        debug!(version, ?dirty, "accelerated environment build");
        self.assemble(build.clone(), resolved, stores, version, dirty.clone())
    }

    /// Equip or clear one item slot.
    pub fn update_item_slot(
        &self,
        previous: &Environment,
        key: &SlotKey,
        item: Option<Item>,
    ) -> Environment {
        let mut build = previous.build.clone();
        build.set_item(key, item);
        let mut stores = Stores::from_previous(previous);
        self.refresh_slot(&build, key, &mut stores.items);

        let mut dirty = DirtyFlags::default();
        dirty.items.mark(key.clone());
        let version = previous.version + 1;
        debug!(version, slot = %key, "item slot update");
        self.assemble(build, previous.resolved_config.clone(), stores, version, dirty)
    }

    /// Allocate `added` and deallocate `removed` passive nodes.
    pub fn apply_passive_diff(
        &self,
        previous: &Environment,
        added: &[NodeId],
        removed: &[NodeId],
    ) -> Environment {
        let mut build = previous.build.clone();
        for id in removed {
            build.allocated_nodes.remove(id);
        }
        build.allocated_nodes.extend(added.iter().copied());

        let mut stores = Stores::from_previous(previous);
        stores.passives = self.passive_store(&build);
        let dirty = DirtyFlags {
            passives: true,
            ..DirtyFlags::default()
        };
        let version = previous.version + 1;
        debug!(
            version,
            added = added.len(),
            removed = removed.len(),
            "passive diff update"
        );
        self.assemble(build, previous.resolved_config.clone(), stores, version, dirty)
    }

    /// Socket, replace or remove the jewel at `socket`.
    pub fn update_jewel(
        &self,
        previous: &Environment,
        socket: NodeId,
        jewel: Option<Item>,
    ) -> Environment {
        let mut build = previous.build.clone();
        match jewel {
            Some(jewel) => {
                build.jewels.insert(socket, jewel);
            }
            None => {
                build.jewels.remove(&socket);
            }
        }
        let mut stores = Stores::from_previous(previous);
        stores.passives = self.passive_store(&build);
        let mut dirty = DirtyFlags::default();
        dirty.jewels.mark(socket);
        let version = previous.version + 1;
        debug!(version, socket, "jewel update");
        self.assemble(build, previous.resolved_config.clone(), stores, version, dirty)
    }

    fn item_stores(&self, build: &BuildSpec) -> BTreeMap<SlotKey, Arc<ModDb>> {
        build
            .slot_keys()
            .filter_map(|key| {
                let item = build.item(&key)?;
                let store = items::build_slot_store(self.parser, &key, item);
                Some((key, Arc::new(store)))
            })
            .collect()
    }

    fn refresh_slot(
        &self,
        build: &BuildSpec,
        key: &SlotKey,
        stores: &mut BTreeMap<SlotKey, Arc<ModDb>>,
    ) {
        match build.item(key) {
            Some(item) => {
                let store = items::build_slot_store(self.parser, key, item);
                stores.insert(key.clone(), Arc::new(store));
            }
            None => {
                stores.remove(key);
            }
        }
    }

    fn passive_store(&self, build: &BuildSpec) -> Arc<ModDb> {
        Arc::new(passives::build_passive_store(self.parser, self.tree, build))
    }

    fn assemble(
        &self,
        build: BuildSpec,
        resolved_config: ResolvedBuildConfig,
        stores: Stores,
        version: u64,
        dirty: DirtyFlags,
    ) -> Environment {
        let active_items = stores
            .items
            .iter()
            .filter(|(key, _)| key.weapon_set == build.active_weapon_set)
            .map(|(_, store)| &**store);
        let player = Arc::new(ModDb::compose(
            std::iter::once(&*stores.passives)
                .chain(active_items)
                .chain([&*stores.skills, &*stores.config]),
        ));

        let mut ctx = QueryContext::new();
        resolved_config.apply_to(&mut ctx);
        let mut resolver = StatResolver::new(Arc::clone(&player)).with_context(ctx);
        let attributes = Attributes {
            strength: resolver.value(STRENGTH),
            dexterity: resolver.value(DEXTERITY),
            intelligence: resolver.value(INTELLIGENCE),
        };

        Environment {
            version,
            player,
            enemy: stores.enemy,
            passives: stores.passives,
            items: stores.items,
            skills: stores.skills,
            config: stores.config,
            attributes,
            build,
            resolved_config,
            dirty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{Gem, SkillGroup, WeaponSet};
    use crate::parser::tables::ParserTables;
    use crate::tree::{ClassStart, InMemoryTree, TreeNode};

    fn parser() -> ModParser {
        ModParser::new(ParserTables::builtin().unwrap()).unwrap()
    }

    fn tree() -> InMemoryTree {
        InMemoryTree::new()
            .with_class(
                "Duelist",
                ClassStart {
                    strength: 23.0,
                    dexterity: 23.0,
                    intelligence: 14.0,
                },
            )
            .with_node(TreeNode {
                id: 1,
                stats: vec!["+10 to Strength".into()],
                ..TreeNode::default()
            })
            .with_node(TreeNode {
                id: 2,
                stats: vec!["10% increased maximum Life".into()],
                ..TreeNode::default()
            })
            .with_node(TreeNode {
                id: 3,
                stats: vec!["Maximum Life becomes 50".into()],
                ..TreeNode::default()
            })
            .with_node(TreeNode {
                id: 5,
                stats: vec!["Maximum Life becomes 1".into()],
                ..TreeNode::default()
            })
            .with_node(TreeNode {
                id: 50,
                is_jewel_socket: true,
                ..TreeNode::default()
            })
    }

    fn build() -> BuildSpec {
        let mut build = BuildSpec::new("Duelist");
        build.allocated_nodes.insert(1);
        build.set_item(
            &SlotKey::new(WeaponSet::First, "Body Armour"),
            Some(Item::new("plate").with_explicit("+50 to maximum Life")),
        );
        build.set_item(
            &SlotKey::new(WeaponSet::First, "Weapon 1"),
            Some(Item::new("sword").with_explicit("Adds 5 to 10 Physical Damage")),
        );
        build.set_item(
            &SlotKey::new(WeaponSet::Second, "Weapon 1"),
            Some(Item::new("bow").with_explicit("+30 to Dexterity")),
        );
        build.skill_groups.push(SkillGroup {
            gems: vec![Gem::new("Cleave")],
            ..SkillGroup::default()
        });
        build
    }

    #[test]
    fn test_full_build() {
        let (p, t) = (parser(), tree());
        let env = EnvironmentBuilder::new(&p, &t).build_full(&build(), None);
        assert_eq!(env.version, 1);
        assert_eq!(env.items.len(), 3);
        assert_eq!(env.attributes.strength, 33.0);
        // Swap weapon is not in the flattened store
        assert_eq!(env.attributes.dexterity, 23.0);
        // 50 from the body armour, 16 from Strength
        assert_eq!(env.resolver().value("Life"), 66.0);
        assert_eq!(env.dirty, DirtyFlags::all());
    }

    #[test]
    fn test_clean_acceleration_reuses_everything() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let first = builder.build_full(&build(), None);
        let second = builder.setup(
            &build(),
            Some(Acceleration {
                previous: &first,
                dirty: None,
            }),
        );
        assert_eq!(second.version, 2);
        assert!(Arc::ptr_eq(&first.player, &second.player));
        assert!(Arc::ptr_eq(&first.passives, &second.passives));
        assert!(second.dirty.is_clean());
    }

    #[test]
    fn test_single_slot_change() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let first = builder.build_full(&build(), None);

        let body = SlotKey::new(WeaponSet::First, "Body Armour");
        let mut changed = build();
        changed.set_item(&body, Some(Item::new("robe").with_explicit("+80 to maximum Life")));
        let second = builder.setup(
            &changed,
            Some(Acceleration {
                previous: &first,
                dirty: None,
            }),
        );

        assert_eq!(second.version, 2);
        assert!(!Arc::ptr_eq(&first.items[&body], &second.items[&body]));
        let weapon = SlotKey::new(WeaponSet::First, "Weapon 1");
        assert!(Arc::ptr_eq(&first.items[&weapon], &second.items[&weapon]));
        assert!(Arc::ptr_eq(&first.passives, &second.passives));
        assert!(Arc::ptr_eq(&first.skills, &second.skills));
        assert!(Arc::ptr_eq(&first.config, &second.config));
        assert!(!Arc::ptr_eq(&first.player, &second.player));
        assert_eq!(second.resolver().value("Life"), 96.0);
    }

    #[test]
    fn test_weapon_swap_only_reflattens() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let first = builder.build_full(&build(), None);
        let mut swapped = build();
        swapped.active_weapon_set = WeaponSet::Second;
        let second = builder.setup(
            &swapped,
            Some(Acceleration {
                previous: &first,
                dirty: None,
            }),
        );
        assert!(second.dirty.weapon_set);
        assert_eq!(second.attributes.dexterity, 53.0);
        assert!(first
            .items
            .iter()
            .all(|(k, s)| Arc::ptr_eq(s, &second.items[k])));
    }

    #[test]
    fn test_passive_diff() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let first = builder.build_full(&build(), None);
        let second = builder.apply_passive_diff(&first, &[2, 999], &[1]);

        assert_eq!(second.version, 2);
        assert!(second.build.allocated_nodes.contains(&2));
        assert!(!second.build.allocated_nodes.contains(&1));
        assert_eq!(second.attributes.strength, 23.0);
        // (50 + 11) * 1.1
        assert!((second.resolver().value("Life") - 67.1).abs() < 1e-9);
        assert!(Arc::ptr_eq(&first.skills, &second.skills));
        let body = SlotKey::new(WeaponSet::First, "Body Armour");
        assert!(Arc::ptr_eq(&first.items[&body], &second.items[&body]));
    }

    #[test]
    fn test_conflicting_overrides_follow_node_order() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let mut spec = build();
        spec.allocated_nodes.insert(5);
        let first = builder.build_full(&spec, None);
        assert_eq!(first.resolver().value("Life"), 1.0);

        // Allocated after node 5, but node 5 still comes last
        let second = builder.apply_passive_diff(&first, &[3], &[]);
        let full = builder.build_full(&second.build, None);
        assert_eq!(second.resolver().value("Life"), 1.0);
        assert_eq!(full.resolver().value("Life"), 1.0);

        let third = builder.apply_passive_diff(&second, &[], &[5]);
        assert_eq!(third.resolver().value("Life"), 50.0);
        let fourth = builder.apply_passive_diff(&third, &[5], &[]);
        assert_eq!(fourth.resolver().value("Life"), 1.0);
    }

    #[test]
    fn test_jewel_update_keeps_canonical_order() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let mut spec = build();
        spec.allocated_nodes.extend([5, 50]);
        let first = builder.build_full(&spec, None);

        let jewel = Item::new("crimson").with_explicit("Maximum Life becomes 20");
        let second = builder.update_jewel(&first, 50, Some(jewel));
        let third = builder.apply_passive_diff(&second, &[3], &[]);
        let full = builder.build_full(&third.build, None);
        // Jewels follow every node
        assert_eq!(third.resolver().value("Life"), 20.0);
        assert_eq!(full.resolver().value("Life"), 20.0);
        assert_eq!(
            third.passives.iter().collect::<Vec<_>>(),
            full.passives.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_jewel_update() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let mut spec = build();
        spec.allocated_nodes.insert(50);
        let first = builder.build_full(&spec, None);

        let jewel = Item::new("viridian").with_explicit("+12 to Dexterity");
        let second = builder.update_jewel(&first, 50, Some(jewel));
        assert_eq!(second.attributes.dexterity, 35.0);
        let third = builder.update_jewel(&second, 50, None);
        assert_eq!(third.attributes.dexterity, 23.0);
        assert_eq!(third.version, 3);
    }

    #[test]
    fn test_update_item_slot_clears() {
        let (p, t) = (parser(), tree());
        let builder = EnvironmentBuilder::new(&p, &t);
        let first = builder.build_full(&build(), None);
        let body = SlotKey::new(WeaponSet::First, "Body Armour");
        let second = builder.update_item_slot(&first, &body, None);
        assert!(!second.items.contains_key(&body));
        assert!(second.dirty.items.contains(&body));
        assert_eq!(second.resolver().value("Life"), 16.0);
    }
}
