//! core
//!
//! Core domain types and operations for Shelfwork.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ItemId, NodeId, Slug, etc.
//! - [`sequence`] - Ordered sequences and gapless renumbering
//! - [`tree`] - Category hierarchy representation and operations
//! - [`campaign`] - Campaign windows and phase classification
//! - [`naming`] - Slug derivation rules
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Sequence positions and tree edges are re-derived, never trusted
//! - All validation is deterministic and happens before any network call

pub mod campaign;
pub mod config;
pub mod naming;
pub mod sequence;
pub mod tree;
pub mod types;
