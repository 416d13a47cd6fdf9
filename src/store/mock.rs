//! store::mock
//!
//! Mock content store implementation for deterministic testing.
//!
//! # Design
//!
//! The mock store provides a deterministic implementation of the
//! `ContentStore` trait for use in tests. It keeps collections and the
//! category tree in memory, records every operation for verification,
//! and allows configuring failure scenarios per method.
//!
//! A test can also *gate* the store: gated calls block until the test
//! releases them, which is how in-flight commits are held open while a
//! newer operation supersedes them.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use shelfwork::core::sequence::OrderedItem;
//! use shelfwork::core::types::{CollectionId, ItemId};
//! use shelfwork::store::{ContentStore, MockStore};
//!
//! # tokio_test::block_on(async {
//! let collection = CollectionId::new("home.blocks").unwrap();
//! let store = MockStore::new().with_items(
//!     collection.clone(),
//!     vec![OrderedItem::new(ItemId::new("blk_1").unwrap(), 0, true, json!({}))],
//! );
//!
//! let items = store.list(&collection).await.unwrap();
//! assert_eq!(items.len(), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use super::traits::{ContentStore, NodeDraft, NodePatch, StoreError};
use crate::core::sequence::{self, OrderedItem};
use crate::core::tree::{CategoryNode, CategoryRecord, CategoryTree, TreeError};
use crate::core::types::{CollectionId, ItemId, NodeId};

/// Mock content store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share
/// state.
#[derive(Debug, Clone)]
pub struct MockStore {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockStoreInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockStoreInner {
    /// Ordered items per collection.
    collections: HashMap<CollectionId, Vec<OrderedItem>>,
    /// The category hierarchy.
    tree: CategoryTree,
    /// Next category id to assign.
    next_node_id: u64,
    /// Method to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Count of `update_position` calls, for nth-call failures.
    position_calls: usize,
    /// When set, calls block until permits are released.
    gate: Option<Arc<Semaphore>>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list with the given error.
    List(StoreError),
    /// Fail update_position with the given error.
    UpdatePosition(StoreError),
    /// Fail only the nth (0-based) update_position call.
    ///
    /// Earlier calls succeed, which is how a mid-sequence partial failure
    /// is staged.
    UpdatePositionNth(usize, StoreError),
    /// Fail update_positions_batch with the given error.
    UpdatePositionsBatch(StoreError),
    /// Fail update_active with the given error.
    UpdateActive(StoreError),
    /// Fail create_node with the given error.
    CreateNode(StoreError),
    /// Fail update_node with the given error.
    UpdateNode(StoreError),
    /// Fail delete_node with the given error.
    DeleteNode(StoreError),
    /// Fail fetch_tree with the given error.
    FetchTree(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone)]
pub enum MockOperation {
    List {
        collection: CollectionId,
    },
    UpdatePosition {
        collection: CollectionId,
        item: ItemId,
        position: u32,
    },
    UpdatePositionsBatch {
        collection: CollectionId,
        ordered: Vec<ItemId>,
    },
    UpdateActive {
        collection: CollectionId,
        item: ItemId,
        active: bool,
    },
    CreateNode {
        parent: Option<NodeId>,
        name: String,
    },
    UpdateNode {
        node: NodeId,
        patch: NodePatch,
    },
    DeleteNode {
        node: NodeId,
    },
    FetchTree,
}

impl MockStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockStoreInner {
                collections: HashMap::new(),
                tree: CategoryTree::new(),
                next_node_id: 1,
                fail_on: None,
                position_calls: 0,
                gate: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Seed a collection with items (builder style).
    pub fn with_items(self, collection: CollectionId, items: Vec<OrderedItem>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.collections.insert(collection, items);
        }
        self
    }

    /// Seed the category tree from a forest (builder style).
    ///
    /// # Panics
    ///
    /// Panics if the forest contains duplicate ids; fixtures are expected
    /// to be well-formed.
    pub fn with_forest(self, forest: Vec<CategoryNode>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.tree = CategoryTree::from_forest(forest).unwrap();
        }
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use shelfwork::store::mock::{FailOn, MockStore};
    /// use shelfwork::store::StoreError;
    ///
    /// let store = MockStore::new().fail_on(FailOn::UpdatePositionsBatch(StoreError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on = None;
    }

    /// Gate the store: subsequent calls block until [`MockStore::release`]
    /// grants them a permit.
    pub fn gate(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Release `n` gated calls.
    pub fn release(&self, n: usize) {
        let inner = self.inner.lock().unwrap();
        if let Some(gate) = &inner.gate {
            gate.add_permits(n);
        }
    }

    /// Remove the gate; pending calls are released.
    pub fn clear_gate(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(gate) = inner.gate.take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    /// Get all recorded operations.
    ///
    /// Useful for verifying call order, e.g. that the per-item strategy
    /// wrote positions strictly in sequence.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.clear();
    }

    /// Get a collection's current items (for test verification).
    pub fn items_sync(&self, collection: &CollectionId) -> Vec<OrderedItem> {
        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Get the current forest (for test verification).
    pub fn forest_sync(&self) -> Vec<CategoryNode> {
        let inner = self.inner.lock().unwrap();
        inner.tree.to_forest()
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    /// Block on the gate if one is installed.
    async fn pass_gate(&self) {
        let gate = {
            let inner = self.inner.lock().unwrap();
            inner.gate.clone()
        };
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    /// Check if this call should fail and return the configured error.
    fn check_fail(&self, expected: &str) -> Option<StoreError> {
        let inner = self.inner.lock().unwrap();
        let nth_due = match &inner.fail_on {
            // position_calls was already incremented for this call
            Some(FailOn::UpdatePositionNth(nth, _)) => inner.position_calls == nth + 1,
            _ => false,
        };
        match &inner.fail_on {
            Some(FailOn::List(e)) if expected == "list" => Some(e.clone()),
            Some(FailOn::UpdatePosition(e)) if expected == "update_position" => Some(e.clone()),
            Some(FailOn::UpdatePositionNth(_, e)) if expected == "update_position" && nth_due => {
                Some(e.clone())
            }
            Some(FailOn::UpdatePositionsBatch(e)) if expected == "update_positions_batch" => {
                Some(e.clone())
            }
            Some(FailOn::UpdateActive(e)) if expected == "update_active" => Some(e.clone()),
            Some(FailOn::CreateNode(e)) if expected == "create_node" => Some(e.clone()),
            Some(FailOn::UpdateNode(e)) if expected == "update_node" => Some(e.clone()),
            Some(FailOn::DeleteNode(e)) if expected == "delete_node" => Some(e.clone()),
            Some(FailOn::FetchTree(e)) if expected == "fetch_tree" => Some(e.clone()),
            _ => None,
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Map tree errors to the store-level errors a real backend would report.
fn map_tree_error(e: TreeError) -> StoreError {
    match e {
        TreeError::UnknownNode(id) => StoreError::NotFound(id.to_string()),
        TreeError::HasChildren(id) => StoreError::NotEmpty(id.to_string()),
        TreeError::Cycle { node, new_parent } => StoreError::ApiError {
            status: 422,
            message: format!("cannot move {node} under its own descendant {new_parent}"),
        },
        TreeError::DuplicateNode(id) => StoreError::ApiError {
            status: 422,
            message: format!("duplicate node {id}"),
        },
    }
}

#[async_trait]
impl ContentStore for MockStore {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list(&self, collection: &CollectionId) -> Result<Vec<OrderedItem>, StoreError> {
        self.record(MockOperation::List {
            collection: collection.clone(),
        });
        self.pass_gate().await;

        if let Some(e) = self.check_fail("list") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .collections
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))
    }

    async fn update_position(
        &self,
        collection: &CollectionId,
        item: &ItemId,
        position: u32,
    ) -> Result<(), StoreError> {
        self.record(MockOperation::UpdatePosition {
            collection: collection.clone(),
            item: item.clone(),
            position,
        });
        {
            let mut inner = self.inner.lock().unwrap();
            inner.position_calls += 1;
        }
        self.pass_gate().await;

        if let Some(e) = self.check_fail("update_position") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let items = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        let target = items
            .iter_mut()
            .find(|candidate| &candidate.id == item)
            .ok_or_else(|| StoreError::NotFound(item.to_string()))?;
        target.position = position;
        // The store keeps its list sorted by position; ties keep
        // insertion order, which is exactly the mid-commit ambiguity a
        // sequential writer produces.
        items.sort_by_key(|candidate| candidate.position);
        Ok(())
    }

    async fn update_positions_batch(
        &self,
        collection: &CollectionId,
        ordered: &[ItemId],
    ) -> Result<(), StoreError> {
        self.record(MockOperation::UpdatePositionsBatch {
            collection: collection.clone(),
            ordered: ordered.to_vec(),
        });
        self.pass_gate().await;

        if let Some(e) = self.check_fail("update_positions_batch") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let items = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;

        if ordered.len() != items.len() {
            return Err(StoreError::ApiError {
                status: 422,
                message: format!(
                    "order carries {} ids but the collection has {} items",
                    ordered.len(),
                    items.len()
                ),
            });
        }

        let mut reordered = Vec::with_capacity(items.len());
        for id in ordered {
            let index = items
                .iter()
                .position(|candidate| &candidate.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            reordered.push(items.remove(index));
        }
        sequence::normalize(&mut reordered);
        *items = reordered;
        Ok(())
    }

    async fn update_active(
        &self,
        collection: &CollectionId,
        item: &ItemId,
        active: bool,
    ) -> Result<(), StoreError> {
        self.record(MockOperation::UpdateActive {
            collection: collection.clone(),
            item: item.clone(),
            active,
        });
        self.pass_gate().await;

        if let Some(e) = self.check_fail("update_active") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let items = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        let target = items
            .iter_mut()
            .find(|candidate| &candidate.id == item)
            .ok_or_else(|| StoreError::NotFound(item.to_string()))?;
        target.active = active;
        Ok(())
    }

    async fn create_node(
        &self,
        parent: Option<&NodeId>,
        draft: NodeDraft,
    ) -> Result<CategoryNode, StoreError> {
        self.record(MockOperation::CreateNode {
            parent: parent.cloned(),
            name: draft.name.clone(),
        });
        self.pass_gate().await;

        if let Some(e) = self.check_fail("create_node") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        let id = NodeId::new(format!("cat_{}", inner.next_node_id)).unwrap();
        inner.next_node_id += 1;

        inner
            .tree
            .insert(
                id.clone(),
                CategoryRecord {
                    name: draft.name.clone(),
                    slug: draft.slug.clone(),
                    active: draft.active,
                    campaign: draft.campaign,
                },
                parent.cloned(),
            )
            .map_err(map_tree_error)?;

        Ok(CategoryNode {
            id,
            name: draft.name,
            slug: draft.slug,
            parent_id: parent.cloned(),
            active: draft.active,
            campaign: draft.campaign,
            children: Vec::new(),
        })
    }

    async fn update_node(&self, node: &NodeId, patch: NodePatch) -> Result<(), StoreError> {
        self.record(MockOperation::UpdateNode {
            node: node.clone(),
            patch: patch.clone(),
        });
        self.pass_gate().await;

        if let Some(e) = self.check_fail("update_node") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(new_parent) = &patch.parent_id {
            inner
                .tree
                .reparent(node, new_parent.as_ref())
                .map_err(map_tree_error)?;
        }

        let record = inner.tree.record_mut(node).map_err(map_tree_error)?;
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(slug) = patch.slug {
            record.slug = slug;
        }
        if let Some(active) = patch.active {
            record.active = active;
        }
        if let Some(campaign) = patch.campaign {
            record.campaign = campaign;
        }
        Ok(())
    }

    async fn delete_node(&self, node: &NodeId) -> Result<(), StoreError> {
        self.record(MockOperation::DeleteNode { node: node.clone() });
        self.pass_gate().await;

        if let Some(e) = self.check_fail("delete_node") {
            return Err(e);
        }

        let mut inner = self.inner.lock().unwrap();
        inner.tree.remove(node).map_err(map_tree_error)
    }

    async fn fetch_tree(&self) -> Result<Vec<CategoryNode>, StoreError> {
        self.record(MockOperation::FetchTree);
        self.pass_gate().await;

        if let Some(e) = self.check_fail("fetch_tree") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        Ok(inner.tree.to_forest())
    }
}
