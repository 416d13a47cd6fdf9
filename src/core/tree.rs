//! core::tree
//!
//! Category hierarchy representation and operations.
//!
//! # Architecture
//!
//! The tree is an arena keyed by node id:
//! - `parents` is the authoritative edge map (`id -> parent`, `None` = root)
//! - `children` is a derived, ordered index rebuilt alongside every edge
//!   change
//! - the nested [`CategoryNode`] forest is a wire/view form only, produced
//!   by [`CategoryTree::to_forest`] and consumed by
//!   [`CategoryTree::from_forest`]
//!
//! The wire form's `parent_id` is denormalized; on load it is overwritten
//! from actual forest membership so the two can never disagree inside the
//! engine.
//!
//! # Invariants
//!
//! - The tree is acyclic; [`CategoryTree::reparent`] rejects any edge that
//!   would make a node its own descendant
//! - Every non-root parent reference resolves to a node in the arena
//! - Child order is preserved across load/rebuild

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use super::campaign::CampaignWindow;
use super::types::{Fingerprint, NodeId, Slug};

/// Errors from tree operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The referenced node is not in the tree.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A node id appeared twice while loading a forest.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// The requested reparent would make a node its own descendant.
    #[error("cannot move {node} under {new_parent}: node would become its own descendant")]
    Cycle { node: NodeId, new_parent: NodeId },

    /// The node still has children.
    #[error("node {0} has children")]
    HasChildren(NodeId),
}

/// A category node in wire/view form.
///
/// `children` is the authoritative parent-to-child edge set on the wire;
/// `parent_id` is a denormalized back-reference for consumers that read a
/// flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: NodeId,
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub active: bool,
    #[serde(default)]
    pub campaign: Option<CampaignWindow>,
    #[serde(default)]
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Create a leaf node.
    pub fn leaf(id: NodeId, name: impl Into<String>, slug: Slug) -> Self {
        Self {
            id,
            name: name.into(),
            slug,
            parent_id: None,
            active: true,
            campaign: None,
            children: Vec::new(),
        }
    }
}

/// Node fields owned by the arena, without edges.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub name: String,
    pub slug: Slug,
    pub active: bool,
    pub campaign: Option<CampaignWindow>,
}

/// A selectable reparent target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOption {
    pub id: NodeId,
    /// Node name prefixed with depth markers, e.g. `"— — Boots"`.
    pub label: String,
}

/// The category hierarchy as an adjacency arena.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    records: HashMap<NodeId, CategoryRecord>,
    /// Authoritative edge map. `None` = root.
    parents: HashMap<NodeId, Option<NodeId>>,
    /// Derived ordered index, kept in sync with `parents`.
    children: HashMap<NodeId, Vec<NodeId>>,
    /// Ordered root list.
    roots: Vec<NodeId>,
}

impl CategoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from the store's nested forest.
    ///
    /// Wire `parent_id` values are ignored; membership in a node's
    /// `children` array decides the edge.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DuplicateNode` if an id appears twice.
    pub fn from_forest(forest: Vec<CategoryNode>) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        for node in forest {
            tree.insert_subtree(node, None)?;
        }
        Ok(tree)
    }

    fn insert_subtree(
        &mut self,
        node: CategoryNode,
        parent: Option<NodeId>,
    ) -> Result<(), TreeError> {
        let CategoryNode {
            id,
            name,
            slug,
            active,
            campaign,
            children,
            ..
        } = node;

        self.insert(
            id.clone(),
            CategoryRecord {
                name,
                slug,
                active,
                campaign,
            },
            parent,
        )?;

        for child in children {
            self.insert_subtree(child, Some(id.clone()))?;
        }
        Ok(())
    }

    /// Insert a node under `parent` (append at the end of its siblings).
    ///
    /// # Errors
    ///
    /// - `TreeError::DuplicateNode` if the id is already present
    /// - `TreeError::UnknownNode` if `parent` does not resolve
    pub fn insert(
        &mut self,
        id: NodeId,
        record: CategoryRecord,
        parent: Option<NodeId>,
    ) -> Result<(), TreeError> {
        if self.records.contains_key(&id) {
            return Err(TreeError::DuplicateNode(id));
        }
        if let Some(parent_id) = &parent {
            if !self.records.contains_key(parent_id) {
                return Err(TreeError::UnknownNode(parent_id.clone()));
            }
        }

        match &parent {
            Some(parent_id) => self
                .children
                .entry(parent_id.clone())
                .or_default()
                .push(id.clone()),
            None => self.roots.push(id.clone()),
        }
        self.parents.insert(id.clone(), parent);
        self.records.insert(id, record);
        Ok(())
    }

    /// Remove a childless node.
    ///
    /// # Errors
    ///
    /// - `TreeError::UnknownNode` if the id does not resolve
    /// - `TreeError::HasChildren` if the node still has children
    pub fn remove(&mut self, id: &NodeId) -> Result<(), TreeError> {
        if !self.records.contains_key(id) {
            return Err(TreeError::UnknownNode(id.clone()));
        }
        if !self.children_of(id).is_empty() {
            return Err(TreeError::HasChildren(id.clone()));
        }

        self.detach(id);
        self.parents.remove(id);
        self.children.remove(id);
        self.records.remove(id);
        Ok(())
    }

    /// Unlink a node from its current parent's child list (or the roots).
    fn detach(&mut self, id: &NodeId) {
        match self.parents.get(id).cloned().flatten() {
            Some(parent_id) => {
                if let Some(siblings) = self.children.get_mut(&parent_id) {
                    siblings.retain(|child| child != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }
    }

    /// Get a node's record.
    pub fn record(&self, id: &NodeId) -> Option<&CategoryRecord> {
        self.records.get(id)
    }

    /// Get a node's record for mutation.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::UnknownNode` if the id does not resolve.
    pub fn record_mut(&mut self, id: &NodeId) -> Result<&mut CategoryRecord, TreeError> {
        self.records
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownNode(id.clone()))
    }

    /// Get the parent of a node (`None` for roots and unknown ids).
    pub fn parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id).and_then(|parent| parent.as_ref())
    }

    /// Get the ordered children of a node.
    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get the ordered roots.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Check membership.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get all descendants of a node (children, grandchildren, etc.).
    ///
    /// Uses breadth-first traversal over the derived children index.
    pub fn descendants(&self, id: &NodeId) -> HashSet<NodeId> {
        let mut result = HashSet::new();
        let mut queue: VecDeque<NodeId> = self.children_of(id).iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                queue.extend(self.children_of(&current).iter().cloned());
            }
        }

        result
    }

    /// Get all ancestors of a node, immediate parent first.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);

        while let Some(parent) = current {
            result.push(parent.clone());
            current = self.parent(parent);
        }

        result
    }

    /// Flatten the tree depth-first into `(id, depth)` pairs.
    pub fn flatten(&self) -> Vec<(NodeId, usize)> {
        let mut result = Vec::with_capacity(self.len());
        for root in &self.roots {
            self.flatten_from(root, 0, &mut result);
        }
        result
    }

    fn flatten_from(&self, id: &NodeId, depth: usize, out: &mut Vec<(NodeId, usize)>) {
        out.push((id.clone(), depth));
        for child in self.children_of(id) {
            self.flatten_from(child, depth + 1, out);
        }
    }

    /// Flatten the tree into valid reparent targets for `exclude`.
    ///
    /// Walks depth-first, emitting `(id, indented label)` for every node
    /// except `exclude` and its entire subtree: a node may never become
    /// its own descendant's parent, so the whole blocked subtree is
    /// skipped rather than just the node itself.
    pub fn parent_options(&self, exclude: &NodeId) -> Vec<ParentOption> {
        let mut blocked: HashSet<NodeId> = self.descendants(exclude);
        blocked.insert(exclude.clone());
        self.labelled_options(&blocked)
    }

    /// Flatten the whole tree into labelled options (no exclusion).
    ///
    /// Used when picking a parent for a node that does not exist yet.
    pub fn options(&self) -> Vec<ParentOption> {
        self.labelled_options(&HashSet::new())
    }

    fn labelled_options(&self, blocked: &HashSet<NodeId>) -> Vec<ParentOption> {
        self.flatten()
            .into_iter()
            .filter(|(id, _)| !blocked.contains(id))
            .map(|(id, depth)| {
                let name = self
                    .records
                    .get(&id)
                    .map(|record| record.name.as_str())
                    .unwrap_or_default();
                ParentOption {
                    label: format!("{}{}", "— ".repeat(depth), name),
                    id,
                }
            })
            .collect()
    }

    /// Check whether reparenting `id` under `new_parent` would create a
    /// cycle.
    pub fn would_create_cycle(&self, id: &NodeId, new_parent: &NodeId) -> bool {
        new_parent == id || self.descendants(id).contains(new_parent)
    }

    /// Move a node under a new parent (append at the end of its siblings).
    ///
    /// # Errors
    ///
    /// - `TreeError::UnknownNode` if either id does not resolve
    /// - `TreeError::Cycle` if the node would become its own descendant
    pub fn reparent(&mut self, id: &NodeId, new_parent: Option<&NodeId>) -> Result<(), TreeError> {
        if !self.records.contains_key(id) {
            return Err(TreeError::UnknownNode(id.clone()));
        }
        if let Some(parent_id) = new_parent {
            if !self.records.contains_key(parent_id) {
                return Err(TreeError::UnknownNode(parent_id.clone()));
            }
            if self.would_create_cycle(id, parent_id) {
                return Err(TreeError::Cycle {
                    node: id.clone(),
                    new_parent: parent_id.clone(),
                });
            }
        }

        self.detach(id);
        match new_parent {
            Some(parent_id) => self
                .children
                .entry(parent_id.clone())
                .or_default()
                .push(id.clone()),
            None => self.roots.push(id.clone()),
        }
        self.parents.insert(id.clone(), new_parent.cloned());
        Ok(())
    }

    /// Rebuild the nested wire form, with `parent_id` normalized from
    /// tree membership.
    pub fn to_forest(&self) -> Vec<CategoryNode> {
        self.roots
            .iter()
            .map(|root| self.build_subtree(root, None))
            .collect()
    }

    fn build_subtree(&self, id: &NodeId, parent: Option<&NodeId>) -> CategoryNode {
        let record = &self.records[id];
        CategoryNode {
            id: id.clone(),
            name: record.name.clone(),
            slug: record.slug.clone(),
            parent_id: parent.cloned(),
            active: record.active,
            campaign: record.campaign,
            children: self
                .children_of(id)
                .iter()
                .map(|child| self.build_subtree(child, Some(id)))
                .collect(),
        }
    }

    /// All `(child, parent)` edges, for fingerprinting.
    pub fn edges(&self) -> Vec<(NodeId, Option<NodeId>)> {
        self.parents
            .iter()
            .map(|(id, parent)| (id.clone(), parent.clone()))
            .collect()
    }

    /// Fingerprint the edge set for divergence detection.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_edges(&self.edges())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    fn node(name: &str, children: Vec<CategoryNode>) -> CategoryNode {
        let mut n = CategoryNode::leaf(
            id(&name.to_lowercase()),
            name,
            Slug::derive(name).unwrap(),
        );
        n.children = children;
        n
    }

    /// Root{A{B,C}} plus a second root.
    fn sample_tree() -> CategoryTree {
        let forest = vec![
            node("Root", vec![node("A", vec![node("B", vec![]), node("C", vec![])])]),
            node("Other", vec![]),
        ];
        CategoryTree::from_forest(forest).unwrap()
    }

    mod loading {
        use super::*;

        #[test]
        fn from_forest_builds_arena() {
            let tree = sample_tree();
            assert_eq!(tree.len(), 5);
            assert_eq!(tree.roots(), &[id("root"), id("other")]);
            assert_eq!(tree.children_of(&id("a")), &[id("b"), id("c")]);
            assert_eq!(tree.parent(&id("b")), Some(&id("a")));
            assert_eq!(tree.parent(&id("root")), None);
        }

        #[test]
        fn duplicate_id_rejected() {
            let forest = vec![node("A", vec![]), node("A", vec![])];
            assert_eq!(
                CategoryTree::from_forest(forest).unwrap_err(),
                TreeError::DuplicateNode(id("a"))
            );
        }

        #[test]
        fn wire_parent_id_is_normalized() {
            // A stale parent_id on the wire loses to forest membership
            let mut child = node("B", vec![]);
            child.parent_id = Some(id("stale"));
            let forest = vec![node("A", vec![child])];

            let tree = CategoryTree::from_forest(forest).unwrap();
            assert_eq!(tree.parent(&id("b")), Some(&id("a")));

            let rebuilt = tree.to_forest();
            assert_eq!(rebuilt[0].children[0].parent_id, Some(id("a")));
        }

        #[test]
        fn empty_forest() {
            let tree = CategoryTree::from_forest(vec![]).unwrap();
            assert!(tree.is_empty());
            assert!(tree.flatten().is_empty());
        }
    }

    mod traversal {
        use super::*;

        #[test]
        fn descendants_includes_whole_subtree() {
            let tree = sample_tree();
            let descendants = tree.descendants(&id("root"));
            assert_eq!(descendants.len(), 3);
            assert!(descendants.contains(&id("a")));
            assert!(descendants.contains(&id("b")));
            assert!(descendants.contains(&id("c")));
        }

        #[test]
        fn descendants_empty_for_leaf() {
            let tree = sample_tree();
            assert!(tree.descendants(&id("b")).is_empty());
        }

        #[test]
        fn ancestors_returns_chain_in_order() {
            let tree = sample_tree();
            assert_eq!(tree.ancestors(&id("b")), vec![id("a"), id("root")]);
            assert!(tree.ancestors(&id("root")).is_empty());
        }

        #[test]
        fn flatten_is_depth_first() {
            let tree = sample_tree();
            let flat: Vec<(String, usize)> = tree
                .flatten()
                .into_iter()
                .map(|(node_id, depth)| (node_id.as_str().to_string(), depth))
                .collect();
            assert_eq!(
                flat,
                vec![
                    ("root".to_string(), 0),
                    ("a".to_string(), 1),
                    ("b".to_string(), 2),
                    ("c".to_string(), 2),
                    ("other".to_string(), 0),
                ]
            );
        }
    }

    mod parent_options {
        use super::*;

        #[test]
        fn excludes_node_and_whole_subtree() {
            // Root{A{B,C}}: options for A must be [Root, Other] only —
            // B and C are blocked, not just A itself
            let tree = sample_tree();
            let options = tree.parent_options(&id("a"));
            let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
            assert_eq!(ids, ["root", "other"]);
        }

        #[test]
        fn leaf_exclusion_keeps_everything_else() {
            let tree = sample_tree();
            let options = tree.parent_options(&id("c"));
            let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
            assert_eq!(ids, ["root", "a", "b", "other"]);
        }

        #[test]
        fn options_without_exclusion_list_everything() {
            let tree = sample_tree();
            let options = tree.options();
            let ids: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
            assert_eq!(ids, ["root", "a", "b", "c", "other"]);
        }

        #[test]
        fn labels_are_depth_indented() {
            let tree = sample_tree();
            let options = tree.parent_options(&id("c"));
            let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
            assert_eq!(labels, ["Root", "— A", "— — B", "Other"]);
        }
    }

    mod reparent {
        use super::*;

        #[test]
        fn moves_node_under_new_parent() {
            let mut tree = sample_tree();
            tree.reparent(&id("c"), Some(&id("other"))).unwrap();
            assert_eq!(tree.parent(&id("c")), Some(&id("other")));
            assert_eq!(tree.children_of(&id("a")), &[id("b")]);
            assert_eq!(tree.children_of(&id("other")), &[id("c")]);
        }

        #[test]
        fn moves_node_to_root() {
            let mut tree = sample_tree();
            tree.reparent(&id("a"), None).unwrap();
            assert_eq!(tree.parent(&id("a")), None);
            assert_eq!(tree.roots(), &[id("root"), id("other"), id("a")]);
            // Subtree rides along
            assert_eq!(tree.parent(&id("b")), Some(&id("a")));
        }

        #[test]
        fn self_parent_rejected() {
            let mut tree = sample_tree();
            assert!(matches!(
                tree.reparent(&id("a"), Some(&id("a"))),
                Err(TreeError::Cycle { .. })
            ));
        }

        #[test]
        fn descendant_parent_rejected() {
            let mut tree = sample_tree();
            let err = tree.reparent(&id("a"), Some(&id("b"))).unwrap_err();
            assert_eq!(
                err,
                TreeError::Cycle {
                    node: id("a"),
                    new_parent: id("b"),
                }
            );
            // Tree unchanged after the failed attempt
            assert_eq!(tree.parent(&id("a")), Some(&id("root")));
        }

        #[test]
        fn unknown_ids_rejected() {
            let mut tree = sample_tree();
            assert!(matches!(
                tree.reparent(&id("ghost"), None),
                Err(TreeError::UnknownNode(_))
            ));
            assert!(matches!(
                tree.reparent(&id("a"), Some(&id("ghost"))),
                Err(TreeError::UnknownNode(_))
            ));
        }

        #[test]
        fn would_create_cycle_matches_option_blocking() {
            let tree = sample_tree();
            for blocked in ["a", "b", "c"] {
                assert!(tree.would_create_cycle(&id("a"), &id(blocked)));
            }
            assert!(!tree.would_create_cycle(&id("a"), &id("root")));
            assert!(!tree.would_create_cycle(&id("a"), &id("other")));
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn insert_appends_to_siblings() {
            let mut tree = sample_tree();
            tree.insert(
                id("d"),
                CategoryRecord {
                    name: "D".into(),
                    slug: Slug::new("d").unwrap(),
                    active: true,
                    campaign: None,
                },
                Some(id("a")),
            )
            .unwrap();
            assert_eq!(tree.children_of(&id("a")), &[id("b"), id("c"), id("d")]);
        }

        #[test]
        fn insert_duplicate_rejected() {
            let mut tree = sample_tree();
            let record = tree.record(&id("b")).unwrap().clone();
            assert_eq!(
                tree.insert(id("b"), record, None).unwrap_err(),
                TreeError::DuplicateNode(id("b"))
            );
        }

        #[test]
        fn remove_leaf() {
            let mut tree = sample_tree();
            tree.remove(&id("c")).unwrap();
            assert!(!tree.contains(&id("c")));
            assert_eq!(tree.children_of(&id("a")), &[id("b")]);
        }

        #[test]
        fn remove_with_children_rejected() {
            let mut tree = sample_tree();
            assert_eq!(
                tree.remove(&id("a")).unwrap_err(),
                TreeError::HasChildren(id("a"))
            );
        }

        #[test]
        fn record_mut_updates_fields() {
            let mut tree = sample_tree();
            tree.record_mut(&id("b")).unwrap().active = false;
            assert!(!tree.record(&id("b")).unwrap().active);
        }
    }

    mod forest_roundtrip {
        use super::*;

        #[test]
        fn to_forest_preserves_structure_and_order() {
            let tree = sample_tree();
            let forest = tree.to_forest();
            assert_eq!(forest.len(), 2);
            assert_eq!(forest[0].id, id("root"));
            assert_eq!(forest[0].children[0].id, id("a"));
            let grandchildren: Vec<&str> = forest[0].children[0]
                .children
                .iter()
                .map(|n| n.id.as_str())
                .collect();
            assert_eq!(grandchildren, ["b", "c"]);
        }

        #[test]
        fn roundtrip_is_stable() {
            let tree = sample_tree();
            let rebuilt = CategoryTree::from_forest(tree.to_forest()).unwrap();
            assert_eq!(tree.to_forest(), rebuilt.to_forest());
            assert_eq!(tree.fingerprint(), rebuilt.fingerprint());
        }

        #[test]
        fn reparent_changes_fingerprint() {
            let mut tree = sample_tree();
            let before = tree.fingerprint();
            tree.reparent(&id("c"), Some(&id("other"))).unwrap();
            assert_ne!(before, tree.fingerprint());
        }
    }
}
