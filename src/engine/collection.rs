//! engine::collection
//!
//! Manager for an ordered sequence of content items.
//!
//! # Architecture
//!
//! The manager owns the working copy of one collection for the lifetime
//! of an editing session. Interaction follows the optimistic cycle:
//!
//! ```text
//! move (local, validated) -> commit (network) -> confirm | reload truth
//! ```
//!
//! # Concurrency
//!
//! At most one operation is in flight per manager instance. Every
//! network-bound operation takes a fresh [`CancellationToken`] and bumps
//! the generation counter; starting a new operation cancels the previous
//! token, and a response is applied only while its generation is still
//! current. A cancelled or superseded operation resolves as a no-op:
//! neither the success nor the failure path runs.
//!
//! # Failure semantics
//!
//! Any persistence failure during commit discards the working copy and
//! reloads the store's truth: once part of a multi-call commit may have
//! landed, the local copy cannot be repaired client-side. A failed
//! active-flag toggle rolls back only that flag.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::events::{ErrorKind, EventSink};
use super::EngineError;
use crate::core::sequence::{self, OrderedItem};
use crate::core::types::{CollectionId, ItemId};
use crate::store::{ContentStore, StoreError};

/// How a proposed order is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitStrategy {
    /// One call carrying the full ordered id list.
    #[default]
    Batch,
    /// One `update_position` call per item, issued strictly in sequence.
    ///
    /// Sequential on purpose: concurrent per-item writes racing each
    /// other could land in an order that no longer matches the intended
    /// sequence.
    PerItem,
}

impl CommitStrategy {
    /// Names accepted in config files and CLI flags.
    pub const NAMES: [&'static str; 2] = ["batch", "per-item"];

    /// Parse a strategy name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "batch" => Some(CommitStrategy::Batch),
            "per-item" => Some(CommitStrategy::PerItem),
            _ => None,
        }
    }

    /// The canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            CommitStrategy::Batch => "batch",
            CommitStrategy::PerItem => "per-item",
        }
    }
}

impl std::fmt::Display for CommitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-collection mutable state.
#[derive(Debug, Default)]
struct CollectionState {
    /// The optimistic view the surface renders.
    working: Vec<OrderedItem>,
    /// The last store-confirmed snapshot.
    confirmed: Vec<OrderedItem>,
    /// Bumped by every network-bound operation.
    generation: u64,
    /// Cancelled and replaced when a new operation supersedes the
    /// in-flight one.
    cancel: CancellationToken,
}

/// Manager for one ordered collection.
///
/// Cheap to clone; clones share the working copy.
#[derive(Clone)]
pub struct OrderedCollectionManager {
    collection: CollectionId,
    strategy: CommitStrategy,
    store: Arc<dyn ContentStore>,
    events: Arc<dyn EventSink>,
    state: Arc<Mutex<CollectionState>>,
}

impl std::fmt::Debug for OrderedCollectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedCollectionManager")
            .field("collection", &self.collection)
            .field("strategy", &self.strategy)
            .field("store", &self.store.name())
            .finish()
    }
}

/// Outcome of a network call raced against its cancellation token.
enum CallOutcome<T> {
    Resolved(T),
    Cancelled,
}

impl OrderedCollectionManager {
    /// Create a manager for `collection`.
    pub fn new(
        store: Arc<dyn ContentStore>,
        events: Arc<dyn EventSink>,
        collection: CollectionId,
        strategy: CommitStrategy,
    ) -> Self {
        Self {
            collection,
            strategy,
            store,
            events,
            state: Arc::new(Mutex::new(CollectionState::default())),
        }
    }

    /// The managed collection id.
    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }

    /// The configured commit strategy.
    pub fn strategy(&self) -> CommitStrategy {
        self.strategy
    }

    /// The current working copy.
    pub fn sequence(&self) -> Vec<OrderedItem> {
        self.state.lock().unwrap().working.clone()
    }

    /// Replace the working copy with the store's current truth.
    ///
    /// Safe to call while an operation is in flight: the pending
    /// operation is superseded and its eventual response ignored. This is
    /// also the rollback path.
    ///
    /// Positions are normalized on the way in (sorted, then renumbered
    /// `0..n-1`); the store's order is trusted, its literal position
    /// values are not.
    pub fn load(&self, mut sequence: Vec<OrderedItem>) {
        sequence.sort_by_key(|item| item.position);
        sequence::normalize(&mut sequence);

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            self.supersede(&mut state);
            state.working = sequence.clone();
            state.confirmed = sequence;
            state.working.clone()
        };
        self.events.sequence_changed(&self.collection, &snapshot);
    }

    /// Re-pull the collection from the store and replace the working copy.
    ///
    /// # Returns
    ///
    /// `true` if the fresh snapshot differs from the last confirmed one
    /// (out-of-band changes landed in the store).
    ///
    /// # Errors
    ///
    /// Returns the store error if the pull fails; the working copy is
    /// left untouched.
    pub async fn refresh(&self) -> Result<bool, EngineError> {
        match self.store.list(&self.collection).await {
            Ok(fresh) => {
                let diverged = {
                    let state = self.state.lock().unwrap();
                    sequence::fingerprint(&fresh) != sequence::fingerprint(&state.confirmed)
                };
                self.load(fresh);
                Ok(diverged)
            }
            Err(e) => {
                self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
                Err(EngineError::Persistence(e))
            }
        }
    }

    /// Compute and apply a new ordering by moving `item` to
    /// `target_index` (clamped).
    ///
    /// The move is optimistic: the working copy takes the proposed order
    /// immediately and the proposal is returned for [`commit`]. Nothing
    /// is persisted here.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Sequence` if `item` is not in the working
    /// copy; the working copy is untouched.
    ///
    /// [`commit`]: OrderedCollectionManager::commit
    pub fn move_item(
        &self,
        item: &ItemId,
        target_index: usize,
    ) -> Result<Vec<OrderedItem>, EngineError> {
        let proposed = {
            let mut state = self.state.lock().unwrap();
            match sequence::move_item(&state.working, item, target_index) {
                Ok(proposed) => {
                    state.working = proposed.clone();
                    proposed
                }
                Err(e) => {
                    drop(state);
                    self.events.error(ErrorKind::InvalidReference, &e.to_string());
                    return Err(e.into());
                }
            }
        };
        self.events.sequence_changed(&self.collection, &proposed);
        Ok(proposed)
    }

    /// Persist a proposed order.
    ///
    /// Supersedes any in-flight operation. On success the proposal
    /// becomes the confirmed snapshot. On failure the working copy is
    /// discarded and the store's truth reloaded, because part of a
    /// multi-call commit may already have landed. A superseded commit
    /// resolves as a no-op.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Persistence` on a store failure.
    pub async fn commit(&self, sequence: Vec<OrderedItem>) -> Result<(), EngineError> {
        let (generation, token) = self.begin_operation();

        let outcome = self.persist_order(&sequence, &token).await;

        let result = match outcome {
            CallOutcome::Cancelled => return Ok(()),
            CallOutcome::Resolved(result) => result,
        };

        {
            let mut state = self.state.lock().unwrap();
            if state.generation != generation {
                // A newer operation took over while this response was in
                // transit; its outcome wins.
                return Ok(());
            }
            if result.is_ok() {
                state.confirmed = sequence;
                return Ok(());
            }
        }

        let e = result.unwrap_err();
        self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
        self.reload_truth(generation).await;
        Err(EngineError::Persistence(e))
    }

    /// Flip an item's active flag.
    ///
    /// Optimistic: the flag flips locally, then persists. A failure rolls
    /// back the single flag, never the whole sequence.
    ///
    /// # Errors
    ///
    /// - `EngineError::Sequence` if the item is unknown
    /// - `EngineError::Persistence` if the store write fails
    pub async fn toggle_active(&self, item: &ItemId) -> Result<bool, EngineError> {
        let (new_active, generation, token) = {
            let mut state = self.state.lock().unwrap();
            let Some(index) = sequence::index_of(&state.working, item) else {
                drop(state);
                let e = sequence::SequenceError::UnknownItem(item.clone());
                self.events.error(ErrorKind::InvalidReference, &e.to_string());
                return Err(e.into());
            };
            state.working[index].active = !state.working[index].active;
            let new_active = state.working[index].active;
            self.supersede(&mut state);
            (new_active, state.generation, state.cancel.clone())
        };
        self.events
            .sequence_changed(&self.collection, &self.sequence());

        let outcome = tokio::select! {
            _ = token.cancelled() => CallOutcome::Cancelled,
            result = self
                .store
                .update_active(&self.collection, item, new_active) => CallOutcome::Resolved(result),
        };

        let result = match outcome {
            CallOutcome::Cancelled => return Ok(new_active),
            CallOutcome::Resolved(result) => result,
        };

        match result {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                if state.generation == generation {
                    if let Some(index) = sequence::index_of(&state.confirmed, item) {
                        state.confirmed[index].active = new_active;
                    }
                }
                Ok(new_active)
            }
            Err(e) => {
                {
                    let mut state = self.state.lock().unwrap();
                    if state.generation != generation {
                        // Superseded; this response is ignored.
                        return Ok(new_active);
                    }
                    if let Some(index) = sequence::index_of(&state.working, item) {
                        state.working[index].active = !new_active;
                    }
                }
                self.events.error(ErrorKind::PersistenceFailed, &e.to_string());
                self.events
                    .sequence_changed(&self.collection, &self.sequence());
                Err(EngineError::Persistence(e))
            }
        }
    }

    /// Cancel the in-flight operation and open a new generation.
    fn begin_operation(&self) -> (u64, CancellationToken) {
        let mut state = self.state.lock().unwrap();
        self.supersede(&mut state);
        (state.generation, state.cancel.clone())
    }

    fn supersede(&self, state: &mut CollectionState) {
        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        state.generation += 1;
    }

    /// Run the configured persistence strategy under the token.
    async fn persist_order(
        &self,
        sequence: &[OrderedItem],
        token: &CancellationToken,
    ) -> CallOutcome<Result<(), StoreError>> {
        match self.strategy {
            CommitStrategy::Batch => {
                let ordered: Vec<ItemId> = sequence.iter().map(|item| item.id.clone()).collect();
                tokio::select! {
                    _ = token.cancelled() => CallOutcome::Cancelled,
                    result = self
                        .store
                        .update_positions_batch(&self.collection, &ordered) => {
                        CallOutcome::Resolved(result)
                    }
                }
            }
            CommitStrategy::PerItem => {
                // Strictly sequential: each write is awaited before the
                // next is issued, so the store never sees racing writes.
                for item in sequence {
                    let result = tokio::select! {
                        _ = token.cancelled() => return CallOutcome::Cancelled,
                        result = self
                            .store
                            .update_position(&self.collection, &item.id, item.position) => result,
                    };
                    if let Err(e) = result {
                        return CallOutcome::Resolved(Err(e));
                    }
                }
                CallOutcome::Resolved(Ok(()))
            }
        }
    }

    /// Reload the store's truth after a failed commit.
    ///
    /// If the reload itself fails, fall back to the last confirmed
    /// snapshot: the user must never be left looking at an order the
    /// store may not hold.
    async fn reload_truth(&self, generation: u64) {
        let fresh = self.store.list(&self.collection).await;

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            if state.generation != generation {
                return;
            }
            match fresh {
                Ok(mut sequence) => {
                    sequence.sort_by_key(|item| item.position);
                    sequence::normalize(&mut sequence);
                    state.working = sequence.clone();
                    state.confirmed = sequence;
                }
                Err(_) => {
                    state.working = state.confirmed.clone();
                }
            }
            state.working.clone()
        };
        self.events.sequence_changed(&self.collection, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_roundtrip() {
        for name in CommitStrategy::NAMES {
            let strategy = CommitStrategy::from_name(name).unwrap();
            assert_eq!(strategy.name(), name);
        }
        assert!(CommitStrategy::from_name("parallel").is_none());
    }

    #[test]
    fn strategy_display() {
        assert_eq!(format!("{}", CommitStrategy::Batch), "batch");
        assert_eq!(format!("{}", CommitStrategy::PerItem), "per-item");
    }

    #[test]
    fn default_strategy_is_batch() {
        assert_eq!(CommitStrategy::default(), CommitStrategy::Batch);
    }
}
