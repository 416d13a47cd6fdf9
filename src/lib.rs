//! Shelfwork - Ordering and hierarchy engine for storefront content
//!
//! Shelfwork maintains the two stateful subsystems behind a storefront's
//! content administration screens: flat ordered sequences of content blocks
//! and the category tree with its time-windowed campaign sub-state. The
//! admin UI itself is a thin shell; this crate owns the invariants.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Managers for ordered collections and the category hierarchy
//! - [`core`] - Domain types, sequence/tree/campaign logic, configuration
//! - [`store`] - Abstraction over the content store of record (REST v1)
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! Shelfwork maintains the following invariants:
//!
//! 1. Positions within a sequence are unique and gapless after every reorder
//! 2. A category node never becomes a descendant of itself
//! 3. The local working copy is provisional until the store confirms it;
//!    any confirmed disagreement discards the working copy wholesale
//! 4. A superseded in-flight commit produces no observable state change

pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
pub mod ui;
