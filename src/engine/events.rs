//! engine::events
//!
//! Engine events consumed by the presentation layer.
//!
//! # Design
//!
//! The managers talk to whatever surface hosts them (admin screen, CLI,
//! test harness) through the [`EventSink`] trait:
//!
//! - `sequence_changed` fires after every successful local mutation
//!   (optimistic) and after every rollback
//! - `tree_changed` is the hierarchy counterpart
//! - `error` fires on any failed operation with an [`ErrorKind`]
//!
//! Cancellation is not an error: a superseded operation resolves as a
//! no-op and emits nothing. [`ErrorKind::Cancelled`] exists so sinks can
//! exhaustively match the taxonomy, but the managers never emit it.
//!
//! The sink is evidence, not authority: it records what the engine did
//! so the surface can follow along, but engine state never depends on a
//! sink observing anything.

use std::sync::Mutex;

use crate::core::sequence::OrderedItem;
use crate::core::tree::CategoryNode;
use crate::core::types::CollectionId;

/// Classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced item or node is not in the working copy.
    InvalidReference,
    /// The requested reparent would make a node its own descendant.
    CycleError,
    /// A campaign window with both endpoints present is not well-ordered.
    InvalidWindow,
    /// A campaign window is missing a required endpoint.
    IncompleteWindow,
    /// The store of record reported a failure.
    PersistenceFailed,
    /// A superseded operation. Suppressed: the managers swallow
    /// cancellation instead of reporting it.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidReference => write!(f, "invalid reference"),
            ErrorKind::CycleError => write!(f, "cycle error"),
            ErrorKind::InvalidWindow => write!(f, "invalid window"),
            ErrorKind::IncompleteWindow => write!(f, "incomplete window"),
            ErrorKind::PersistenceFailed => write!(f, "persistence failed"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Sink for engine events.
///
/// Implementations must be `Send + Sync`; the managers may fire events
/// from async tasks.
pub trait EventSink: Send + Sync {
    /// The working copy of `collection` changed (optimistic mutation or
    /// rollback).
    fn sequence_changed(&self, collection: &CollectionId, sequence: &[OrderedItem]);

    /// The working copy of the tree changed (optimistic mutation or
    /// rollback).
    fn tree_changed(&self, forest: &[CategoryNode]);

    /// An operation failed.
    fn error(&self, kind: ErrorKind, message: &str);
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn sequence_changed(&self, _collection: &CollectionId, _sequence: &[OrderedItem]) {}
    fn tree_changed(&self, _forest: &[CategoryNode]) {}
    fn error(&self, _kind: ErrorKind, _message: &str) {}
}

/// An event captured by [`EventLog`].
#[derive(Debug, Clone)]
pub enum EngineEvent {
    SequenceChanged {
        collection: CollectionId,
        sequence: Vec<OrderedItem>,
    },
    TreeChanged {
        forest: Vec<CategoryNode>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

/// A recording sink for tests and the CLI's debug output.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<EngineEvent>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in order.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Only the recorded errors, in order.
    pub fn errors(&self) -> Vec<(ErrorKind, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Error { kind, message } => Some((*kind, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// The most recent sequence snapshot, if any change fired.
    pub fn last_sequence(&self) -> Option<Vec<OrderedItem>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|event| match event {
                EngineEvent::SequenceChanged { sequence, .. } => Some(sequence.clone()),
                _ => None,
            })
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for EventLog {
    fn sequence_changed(&self, collection: &CollectionId, sequence: &[OrderedItem]) {
        self.events.lock().unwrap().push(EngineEvent::SequenceChanged {
            collection: collection.clone(),
            sequence: sequence.to_vec(),
        });
    }

    fn tree_changed(&self, forest: &[CategoryNode]) {
        self.events.lock().unwrap().push(EngineEvent::TreeChanged {
            forest: forest.to_vec(),
        });
    }

    fn error(&self, kind: ErrorKind, message: &str) {
        self.events.lock().unwrap().push(EngineEvent::Error {
            kind,
            message: message.to_string(),
        });
    }
}
