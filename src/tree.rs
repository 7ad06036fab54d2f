//! Passive tree read interface.
//!
//! The calculator needs very little from the tree dataset: node lookup by
//! id and the starting attributes of each class. Anything that can answer
//! those two questions can back a build.

use crate::attributes::Attributes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Passive node identifier. Jewel sockets are nodes too.
pub type NodeId = u32;

/// One passive tree node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    /// Stat lines granted when allocated.
    pub stats: Vec<String>,
    pub is_notable: bool,
    pub is_keystone: bool,
    pub is_mastery: bool,
    pub is_ascendancy: bool,
    pub is_jewel_socket: bool,
    /// Selectable effects of a mastery node, by effect id.
    pub mastery_effects: BTreeMap<u32, Vec<String>>,
}

/// Read access to a passive tree dataset.
///
/// Implementations must be deterministic: the same id always yields the
/// same node.
pub trait PassiveTree: Send + Sync {
    /// Look up a node. Unknown ids return `None`.
    fn node(&self, id: NodeId) -> Option<&TreeNode>;

    /// Starting attributes of a class. Unknown classes return `None`.
    fn class_attributes(&self, class: &str) -> Option<Attributes>;
}

/// Class starting attributes as stored in a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassStart {
    pub strength: f64,
    pub dexterity: f64,
    pub intelligence: f64,
}

/// A tree held in memory, loadable from JSON.
///
/// # Examples
///
/// ```rust
/// use modcalc::tree::{InMemoryTree, PassiveTree};
///
/// let tree: InMemoryTree = serde_json::from_str(r#"{
///     "classes": {"Marauder": {"strength": 32, "dexterity": 14, "intelligence": 14}},
///     "nodes": [{"id": 7, "name": "Toughness", "stats": ["+10 to maximum Life"]}]
/// }"#).unwrap();
///
/// assert_eq!(tree.node(7).unwrap().name, "Toughness");
/// assert!(tree.node(8).is_none());
/// assert_eq!(tree.class_attributes("Marauder").unwrap().strength, 32.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "TreeDocument", into = "TreeDocument")]
pub struct InMemoryTree {
    classes: BTreeMap<String, ClassStart>,
    nodes: HashMap<NodeId, TreeNode>,
}

/// Serialized form of a tree: classes by name plus a node list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeDocument {
    pub classes: BTreeMap<String, ClassStart>,
    pub nodes: Vec<TreeNode>,
}

impl From<TreeDocument> for InMemoryTree {
    fn from(data: TreeDocument) -> Self {
        let mut tree = InMemoryTree {
            classes: data.classes,
            nodes: HashMap::with_capacity(data.nodes.len()),
        };
        for node in data.nodes {
            tree.insert(node);
        }
        tree
    }
}

impl From<InMemoryTree> for TreeDocument {
    fn from(tree: InMemoryTree) -> Self {
        let mut nodes: Vec<TreeNode> = tree.nodes.into_values().collect();
        nodes.sort_by_key(|n| n.id);
        TreeDocument {
            classes: tree.classes,
            nodes,
        }
    }
}

impl InMemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: TreeNode) {
        self.nodes.insert(node.id, node);
    }

    pub fn with_node(mut self, node: TreeNode) -> Self {
        self.insert(node);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>, start: ClassStart) -> Self {
        self.classes.insert(class.into(), start);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl PassiveTree for InMemoryTree {
    fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    fn class_attributes(&self, class: &str) -> Option<Attributes> {
        self.classes.get(class).map(|c| Attributes {
            strength: c.strength,
            dexterity: c.dexterity,
            intelligence: c.intelligence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let tree = InMemoryTree::new()
            .with_node(TreeNode {
                id: 1,
                name: "Resolute Technique".into(),
                is_keystone: true,
                ..TreeNode::default()
            })
            .with_class(
                "Duelist",
                ClassStart {
                    strength: 23.0,
                    dexterity: 23.0,
                    intelligence: 14.0,
                },
            );
        assert_eq!(tree.len(), 1);
        assert!(tree.node(1).unwrap().is_keystone);
        assert!(tree.class_attributes("Witch").is_none());
    }

    #[test]
    fn test_json_round_trip_keeps_nodes() {
        let tree = InMemoryTree::new().with_node(TreeNode {
            id: 42,
            stats: vec!["+5 to Strength".into()],
            ..TreeNode::default()
        });
        let json = serde_json::to_string(&tree).unwrap();
        let back: InMemoryTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back.node(42), tree.node(42));
    }
}
