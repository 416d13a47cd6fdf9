//! engine::hierarchy
//!
//! Manager for the category tree and its campaign sub-state.
//!
//! # Architecture
//!
//! The manager owns the working copy of the hierarchy for one editing
//! session. Structural validation (unknown nodes, cycles) happens before
//! any network call; the store of record re-validates on its side, since
//! this snapshot can be stale. Reparents and field updates are
//! optimistic; any persistence failure discards the tree and reloads
//! truth.
//!
//! # Cycle prevention
//!
//! [`parent_options`] flattens the tree depth-first and blocks the
//! excluded node's entire subtree, so a node can never be offered (or
//! accept) one of its own descendants as a parent. [`reparent`] enforces
//! the same rule before proposing the change to the store.
//!
//! # Campaign windows
//!
//! Enabling a campaign requires a complete, well-ordered window; clearing
//! one never validates. `Scheduled`/`Live`/`Ended` are derived via
//! [`classify`](crate::core::campaign::classify) with an explicit `now`
//! and are never persisted.
//!
//! [`parent_options`]: HierarchyManager::parent_options
//! [`reparent`]: HierarchyManager::reparent

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::events::{ErrorKind, EventSink};
use super::EngineError;
use crate::core::campaign::{
    classify, validate_window, CampaignPhase, CampaignWindow, WindowPolicy,
};
use crate::core::tree::{
    CategoryNode, CategoryRecord, CategoryTree, ParentOption, TreeError,
};
use crate::core::types::{NodeId, Slug, UtcTimestamp};
use crate::store::{ContentStore, NodeDraft, NodePatch};

/// Per-tree mutable state.
#[derive(Debug, Default)]
struct HierarchyState {
    /// The optimistic view the surface renders.
    tree: CategoryTree,
    /// Bumped by every network-bound operation.
    generation: u64,
    /// Cancelled and replaced when a new operation supersedes the
    /// in-flight one.
    cancel: CancellationToken,
}

/// Manager for the category hierarchy.
///
/// Cheap to clone; clones share the working copy.
#[derive(Clone)]
pub struct HierarchyManager {
    store: Arc<dyn ContentStore>,
    events: Arc<dyn EventSink>,
    state: Arc<Mutex<HierarchyState>>,
}

impl std::fmt::Debug for HierarchyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyManager")
            .field("store", &self.store.name())
            .finish()
    }
}

/// Outcome of a network call raced against its cancellation token.
enum CallOutcome<T> {
    Resolved(T),
    Cancelled,
}

impl HierarchyManager {
    /// Create a manager over `store`.
    pub fn new(store: Arc<dyn ContentStore>, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            events,
            state: Arc::new(Mutex::new(HierarchyState::default())),
        }
    }

    /// Replace the working copy with the store's current forest.
    ///
    /// Safe to call while an operation is in flight: the pending
    /// operation is superseded and its eventual response ignored. This is
    /// also the rollback path.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Tree` if the forest is malformed (duplicate
    /// ids); the working copy is left untouched.
    pub fn load(&self, forest: Vec<CategoryNode>) -> Result<(), EngineError> {
        let tree = match CategoryTree::from_forest(forest) {
            Ok(tree) => tree,
            Err(e) => {
                self.events
                    .error(EngineError::from(e.clone()).kind(), &e.to_string());
                return Err(e.into());
            }
        };

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            self.supersede(&mut state);
            state.tree = tree;
            state.tree.to_forest()
        };
        self.events.tree_changed(&snapshot);
        Ok(())
    }

    /// Re-pull the forest from the store and replace the working copy.
    ///
    /// # Returns
    ///
    /// `true` if the fresh edge set differs from the working one
    /// (out-of-band changes landed in the store).
    ///
    /// # Errors
    ///
    /// Returns the store error if the pull fails; the working copy is
    /// left untouched.
    pub async fn refresh(&self) -> Result<bool, EngineError> {
        match self.store.fetch_tree().await {
            Ok(forest) => {
                let fresh = CategoryTree::from_forest(forest)?;
                let diverged = {
                    let state = self.state.lock().unwrap();
                    fresh.fingerprint() != state.tree.fingerprint()
                };
                let snapshot = {
                    let mut state = self.state.lock().unwrap();
                    self.supersede(&mut state);
                    state.tree = fresh;
                    state.tree.to_forest()
                };
                self.events.tree_changed(&snapshot);
                Ok(diverged)
            }
            Err(e) => {
                self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
                Err(EngineError::Persistence(e))
            }
        }
    }

    /// The current working forest.
    pub fn forest(&self) -> Vec<CategoryNode> {
        self.state.lock().unwrap().tree.to_forest()
    }

    /// A node's fields (without edges).
    pub fn record(&self, node: &NodeId) -> Option<CategoryRecord> {
        self.state.lock().unwrap().tree.record(node).cloned()
    }

    /// A node's current parent.
    pub fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        self.state.lock().unwrap().tree.parent(node).cloned()
    }

    /// Valid reparent targets.
    ///
    /// With `exclude` set, the excluded node and its entire subtree are
    /// blocked; with `None` (picking a parent for a node that does not
    /// exist yet) every node is offered.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Tree` if `exclude` is not in the tree.
    pub fn parent_options(
        &self,
        exclude: Option<&NodeId>,
    ) -> Result<Vec<ParentOption>, EngineError> {
        let state = self.state.lock().unwrap();
        match exclude {
            Some(node) if !state.tree.contains(node) => {
                let e = TreeError::UnknownNode(node.clone());
                drop(state);
                self.events.error(ErrorKind::InvalidReference, &e.to_string());
                Err(e.into())
            }
            Some(node) => Ok(state.tree.parent_options(node)),
            None => Ok(state.tree.options()),
        }
    }

    /// Classify a node's campaign at an explicit instant.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Tree` if the node is unknown.
    pub fn classify_campaign(
        &self,
        node: &NodeId,
        now: UtcTimestamp,
    ) -> Result<CampaignPhase, EngineError> {
        let state = self.state.lock().unwrap();
        let record = state
            .tree
            .record(node)
            .ok_or_else(|| TreeError::UnknownNode(node.clone()))?;
        Ok(classify(record.campaign.as_ref(), now))
    }

    /// Move a node under a new parent (`None` = root).
    ///
    /// Validated locally first: the target must exist and must not be the
    /// node itself or one of its descendants. The change then applies
    /// optimistically and persists; on failure the tree reloads from the
    /// store. The store re-validates regardless, since this snapshot may
    /// be stale.
    ///
    /// # Errors
    ///
    /// - `EngineError::Tree` on unknown ids or a would-be cycle
    /// - `EngineError::Persistence` if the store write fails
    pub async fn reparent(
        &self,
        node: &NodeId,
        new_parent: Option<&NodeId>,
    ) -> Result<(), EngineError> {
        let (generation, token) = {
            let mut state = self.state.lock().unwrap();
            if let Err(e) = state.tree.reparent(node, new_parent) {
                drop(state);
                self.events
                    .error(EngineError::from(e.clone()).kind(), &e.to_string());
                return Err(e.into());
            }
            self.supersede(&mut state);
            (state.generation, state.cancel.clone())
        };
        self.events.tree_changed(&self.forest());

        let patch = NodePatch::reparent(new_parent.cloned());
        self.persist_patch(node, patch, generation, token).await
    }

    /// Create a category under `parent` (`None` = root).
    ///
    /// The slug derives from `name` unless given explicitly; a campaign
    /// on a brand-new node must carry a complete, well-ordered window.
    /// Creation is not optimistic: the store assigns the id, so the node
    /// joins the working copy only after the store confirms it.
    ///
    /// # Errors
    ///
    /// - `EngineError::Tree` if `parent` is unknown
    /// - `EngineError::Type` if no usable slug can be derived
    /// - `EngineError::Campaign` if the window fails creation policy
    /// - `EngineError::Persistence` if the store rejects the create
    pub async fn create_category(
        &self,
        parent: Option<&NodeId>,
        name: &str,
        slug: Option<Slug>,
        campaign: Option<CampaignWindow>,
    ) -> Result<CategoryNode, EngineError> {
        {
            let state = self.state.lock().unwrap();
            if let Some(parent_id) = parent {
                if !state.tree.contains(parent_id) {
                    let e = TreeError::UnknownNode(parent_id.clone());
                    drop(state);
                    self.events.error(ErrorKind::InvalidReference, &e.to_string());
                    return Err(e.into());
                }
            }
        }
        if let Some(window) = &campaign {
            if let Err(e) = validate_window(window, WindowPolicy::RequireBoth) {
                self.events
                    .error(EngineError::from(e.clone()).kind(), &e.to_string());
                return Err(e.into());
            }
        }
        let slug = match slug {
            Some(slug) => slug,
            None => match Slug::derive(name) {
                Ok(slug) => slug,
                Err(e) => {
                    self.events.error(ErrorKind::InvalidReference, &e.to_string());
                    return Err(e.into());
                }
            },
        };

        let draft = NodeDraft {
            name: name.to_string(),
            slug: slug.clone(),
            active: true,
            campaign,
        };
        let created = match self.store.create_node(parent, draft).await {
            Ok(created) => created,
            Err(e) => {
                self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
                return Err(EngineError::Persistence(e));
            }
        };

        {
            let mut state = self.state.lock().unwrap();
            state.tree.insert(
                created.id.clone(),
                CategoryRecord {
                    name: created.name.clone(),
                    slug: created.slug.clone(),
                    active: created.active,
                    campaign: created.campaign,
                },
                parent.cloned(),
            )?;
        }
        self.events.tree_changed(&self.forest());
        Ok(created)
    }

    /// Apply a partial update to a node.
    ///
    /// A reparent inside the patch is cycle-checked; a campaign inside
    /// the patch follows the enable policy (complete window required).
    /// The patch applies optimistically and persists; on failure the tree
    /// reloads from the store.
    ///
    /// # Errors
    ///
    /// - `EngineError::Tree` on unknown ids or a would-be cycle
    /// - `EngineError::Campaign` on a rejected window
    /// - `EngineError::Persistence` if the store write fails
    pub async fn update_category(
        &self,
        node: &NodeId,
        patch: NodePatch,
    ) -> Result<(), EngineError> {
        if let Some(Some(window)) = &patch.campaign {
            if let Err(e) = validate_window(window, WindowPolicy::RequireBoth) {
                self.events
                    .error(EngineError::from(e.clone()).kind(), &e.to_string());
                return Err(e.into());
            }
        }

        let (generation, token) = {
            let mut state = self.state.lock().unwrap();
            if let Some(new_parent) = &patch.parent_id {
                if let Err(e) = state.tree.reparent(node, new_parent.as_ref()) {
                    drop(state);
                    self.events
                        .error(EngineError::from(e.clone()).kind(), &e.to_string());
                    return Err(e.into());
                }
            }
            let record = match state.tree.record_mut(node) {
                Ok(record) => record,
                Err(e) => {
                    drop(state);
                    self.events.error(ErrorKind::InvalidReference, &e.to_string());
                    return Err(e.into());
                }
            };
            if let Some(name) = &patch.name {
                record.name = name.clone();
            }
            if let Some(slug) = &patch.slug {
                record.slug = slug.clone();
            }
            if let Some(active) = patch.active {
                record.active = active;
            }
            if let Some(campaign) = patch.campaign {
                record.campaign = campaign;
            }
            self.supersede(&mut state);
            (state.generation, state.cancel.clone())
        };
        self.events.tree_changed(&self.forest());

        self.persist_patch(node, patch, generation, token).await
    }

    /// Replace (or clear) a node's campaign window.
    ///
    /// Setting a window follows the enable policy: both endpoints,
    /// well-ordered. Clearing never validates.
    pub async fn set_campaign(
        &self,
        node: &NodeId,
        campaign: Option<CampaignWindow>,
    ) -> Result<(), EngineError> {
        self.update_category(node, NodePatch::set_campaign(campaign))
            .await
    }

    /// Flip a node's active flag.
    ///
    /// Optimistic; a failure rolls back the single flag without touching
    /// the rest of the tree.
    ///
    /// # Errors
    ///
    /// - `EngineError::Tree` if the node is unknown
    /// - `EngineError::Persistence` if the store write fails
    pub async fn toggle_active(&self, node: &NodeId) -> Result<bool, EngineError> {
        let (new_active, generation, token) = {
            let mut state = self.state.lock().unwrap();
            let record = match state.tree.record_mut(node) {
                Ok(record) => record,
                Err(e) => {
                    drop(state);
                    self.events.error(ErrorKind::InvalidReference, &e.to_string());
                    return Err(e.into());
                }
            };
            record.active = !record.active;
            let new_active = record.active;
            self.supersede(&mut state);
            (new_active, state.generation, state.cancel.clone())
        };
        self.events.tree_changed(&self.forest());

        let outcome = tokio::select! {
            _ = token.cancelled() => CallOutcome::Cancelled,
            result = self
                .store
                .update_node(node, NodePatch::set_active(new_active)) => {
                CallOutcome::Resolved(result)
            }
        };

        match outcome {
            CallOutcome::Cancelled => Ok(new_active),
            CallOutcome::Resolved(Ok(())) => Ok(new_active),
            CallOutcome::Resolved(Err(e)) => {
                {
                    let mut state = self.state.lock().unwrap();
                    if state.generation != generation {
                        // Superseded; this response is ignored.
                        return Ok(new_active);
                    }
                    if let Ok(record) = state.tree.record_mut(node) {
                        record.active = !new_active;
                    }
                }
                self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
                self.events.tree_changed(&self.forest());
                Err(EngineError::Persistence(e))
            }
        }
    }

    /// Delete a node.
    ///
    /// Not optimistic: the store enforces the children check (`NotEmpty`),
    /// so the node leaves the working copy only after the store confirms
    /// the delete. The engine's only local validation is that the node
    /// exists.
    ///
    /// # Errors
    ///
    /// - `EngineError::Tree` if the node is unknown locally
    /// - `EngineError::Persistence` if the store rejects the delete
    ///   (including `NotEmpty`)
    pub async fn delete_category(&self, node: &NodeId) -> Result<(), EngineError> {
        {
            let state = self.state.lock().unwrap();
            if !state.tree.contains(node) {
                let e = TreeError::UnknownNode(node.clone());
                drop(state);
                self.events.error(ErrorKind::InvalidReference, &e.to_string());
                return Err(e.into());
            }
        }

        if let Err(e) = self.store.delete_node(node).await {
            self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
            self.reload_truth_latest().await;
            return Err(EngineError::Persistence(e));
        }

        {
            let mut state = self.state.lock().unwrap();
            // The local snapshot may hold children the store no longer
            // has; a failed local remove just means the next refresh
            // reconciles.
            let _ = state.tree.remove(node);
        }
        self.events.tree_changed(&self.forest());
        Ok(())
    }

    fn supersede(&self, state: &mut HierarchyState) {
        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        state.generation += 1;
    }

    /// Persist a patch under the token; on failure reload truth.
    async fn persist_patch(
        &self,
        node: &NodeId,
        patch: NodePatch,
        generation: u64,
        token: CancellationToken,
    ) -> Result<(), EngineError> {
        let outcome = tokio::select! {
            _ = token.cancelled() => CallOutcome::Cancelled,
            result = self.store.update_node(node, patch) => CallOutcome::Resolved(result),
        };

        let result = match outcome {
            CallOutcome::Cancelled => return Ok(()),
            CallOutcome::Resolved(result) => result,
        };

        {
            let state = self.state.lock().unwrap();
            if state.generation != generation {
                // A newer operation took over; its outcome wins.
                return Ok(());
            }
        }

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
                self.reload_truth(generation).await;
                Err(EngineError::Persistence(e))
            }
        }
    }

    /// Reload the store's truth after a failed mutation.
    ///
    /// If the reload itself fails, the optimistic change is backed out by
    /// the next successful refresh; the error already surfaced.
    async fn reload_truth(&self, generation: u64) {
        let fresh = self.store.fetch_tree().await;

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            if state.generation != generation {
                return;
            }
            match fresh.map(CategoryTree::from_forest) {
                Ok(Ok(tree)) => state.tree = tree,
                // Unreachable store or malformed payload: keep the
                // current copy; the surface already saw the error.
                _ => {}
            }
            state.tree.to_forest()
        };
        self.events.tree_changed(&snapshot);
    }

    /// Reload truth regardless of generation (used after failed deletes,
    /// which never superseded anything).
    async fn reload_truth_latest(&self) {
        if let Ok(forest) = self.store.fetch_tree().await {
            if let Ok(tree) = CategoryTree::from_forest(forest) {
                let snapshot = {
                    let mut state = self.state.lock().unwrap();
                    state.tree = tree;
                    state.tree.to_forest()
                };
                self.events.tree_changed(&snapshot);
            }
        }
    }
}
