//! engine
//!
//! Managers for ordered collections and the category hierarchy.
//!
//! # Architecture
//!
//! The engine sits between a surface (admin screen, CLI) and the
//! [`ContentStore`](crate::store::ContentStore). Every mutation follows a
//! uniform lifecycle:
//!
//! ```text
//! validate (local, synchronous) -> apply optimistically -> persist
//!   -> confirm | reload truth
//! ```
//!
//! Validation errors never reach the store and leave the working copy
//! untouched. Persistence errors always discard local state and reload
//! truth wholesale; the engine never replays or partially retries a
//! failed multi-step commit, since a retried sequential commit could
//! apply positions twice or out of order.
//!
//! # Concurrency
//!
//! Single-flight per manager instance: a new network-bound operation
//! cancels the in-flight one, and a superseded response is never applied.
//! See [`collection`] for the generation-counter mechanics.
//!
//! # Invariants
//!
//! - Validation errors are synchronous and side-effect free
//! - A commit response is applied only while its generation is current
//! - After any failed commit the surface sees the store's actual order

pub mod collection;
pub mod events;
pub mod hierarchy;

// Re-exports for convenience
pub use collection::{CommitStrategy, OrderedCollectionManager};
pub use events::{EngineEvent, ErrorKind, EventLog, EventSink, NullSink};
pub use hierarchy::HierarchyManager;

use thiserror::Error;

use crate::core::campaign::CampaignError;
use crate::core::sequence::SequenceError;
use crate::core::tree::TreeError;
use crate::core::types::TypeError;
use crate::store::StoreError;

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A sequence reference failed validation.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// A tree reference or edge failed validation.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A campaign window failed validation.
    #[error(transparent)]
    Campaign(#[from] CampaignError),

    /// A core type failed validation.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The store of record reported a failure.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl EngineError {
    /// The event-taxonomy kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Sequence(_) => ErrorKind::InvalidReference,
            EngineError::Tree(TreeError::Cycle { .. }) => ErrorKind::CycleError,
            EngineError::Tree(TreeError::UnknownNode(_)) => ErrorKind::InvalidReference,
            EngineError::Tree(_) => ErrorKind::PersistenceFailed,
            EngineError::Campaign(CampaignError::InvalidWindow { .. }) => ErrorKind::InvalidWindow,
            EngineError::Campaign(CampaignError::IncompleteWindow) => ErrorKind::IncompleteWindow,
            EngineError::Type(_) => ErrorKind::InvalidReference,
            EngineError::Persistence(_) => ErrorKind::PersistenceFailed,
        }
    }
}
