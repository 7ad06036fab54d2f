//! Passive tree store.
//!
//! The passive store holds the class's starting attributes, the stats of
//! every allocated node, a flag per allocated keystone, and the lines of
//! jewels socketed into allocated sockets.

use super::parse_into;
use crate::attributes::{DEXTERITY, INTELLIGENCE, STRENGTH};
use crate::build::{BuildSpec, Item};
use crate::modifier::{Mod, ModKind, ModSource, SourceCategory};
use crate::parser::{ModParser, ParseContext};
use crate::store::ModDb;
use crate::tree::{NodeId, PassiveTree};
use tracing::trace;

/// Build the full passive store for a build.
///
/// Nodes go in in id order, then jewels in socket order. Incremental
/// updates rebuild through here so that override precedence never depends
/// on the order of allocation.
pub fn build_passive_store(parser: &ModParser, tree: &dyn PassiveTree, build: &BuildSpec) -> ModDb {
    let mut store = ModDb::new();
    add_class_attributes(tree, &build.class, &mut store);
    for &id in &build.allocated_nodes {
        add_node(parser, tree, build, id, &mut store);
    }
    for (&socket, jewel) in &build.jewels {
        if build.allocated_nodes.contains(&socket) {
            add_jewel(parser, socket, jewel, &mut store);
        }
    }
    store
}

/// Starting Strength, Dexterity and Intelligence of the class.
pub fn add_class_attributes(tree: &dyn PassiveTree, class: &str, store: &mut ModDb) {
    let Some(start) = tree.class_attributes(class) else {
        trace!(class, "unknown class; no starting attributes");
        return;
    };
    let source = ModSource::with_id(SourceCategory::Class, class);
    for (stat, value) in [
        (STRENGTH, start.strength),
        (DEXTERITY, start.dexterity),
        (INTELLIGENCE, start.intelligence),
    ] {
        store.add(Mod::new(stat, ModKind::Base, value, source.clone()));
    }
}

/// Add one allocated node. Ids missing from the tree are ignored.
pub fn add_node(
    parser: &ModParser,
    tree: &dyn PassiveTree,
    build: &BuildSpec,
    id: NodeId,
    store: &mut ModDb,
) {
    let Some(node) = tree.node(id) else {
        trace!(node = id, "passive node not in tree; skipped");
        return;
    };
    let source = ModSource::with_id(SourceCategory::Passive, id.to_string());
    let ctx = ParseContext::new(source.clone());
    if node.is_mastery {
        // Only the selected effect counts
        let selected = build
            .mastery_selections
            .get(&id)
            .and_then(|effect| node.mastery_effects.get(effect));
        match selected {
            Some(lines) => {
                parse_into(parser, store, lines.iter().map(String::as_str), &ctx);
            }
            None => trace!(node = id, "mastery without a known selection; skipped"),
        }
        return;
    }
    parse_into(parser, store, node.stats.iter().map(String::as_str), &ctx);
    if node.is_keystone {
        store.add(Mod::flag(format!("Keystone:{}", node.name), source));
    }
}

/// Add a jewel socketed at `socket`.
pub fn add_jewel(parser: &ModParser, socket: NodeId, jewel: &Item, store: &mut ModDb) {
    let ctx = ParseContext::new(ModSource::with_id(SourceCategory::Jewel, socket.to_string()));
    parse_into(parser, store, jewel.lines(), &ctx);
}
