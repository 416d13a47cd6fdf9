//! store::traits
//!
//! ContentStore trait definition for the store of record.
//!
//! # Design
//!
//! The `ContentStore` trait is async because store operations involve
//! network I/O. All methods return `Result` to handle API errors
//! gracefully.
//!
//! The store is the single writer of truth:
//! - It assigns every identifier; the engine never mints ids
//! - It re-validates reparent targets; the engine's cycle check is
//!   advisory defense against a stale snapshot
//! - It enforces delete-time referential integrity (`NotEmpty`)
//! - `update_positions_batch` must apply positions in exactly the order
//!   of the id list it is given
//!
//! # Example
//!
//! ```ignore
//! use shelfwork::store::{ContentStore, StoreError};
//! use shelfwork::core::types::CollectionId;
//!
//! async fn render_order(store: &dyn ContentStore) -> Result<(), StoreError> {
//!     let collection = CollectionId::new("home.blocks").unwrap();
//!     let items = store.list(&collection).await?;
//!     for item in items {
//!         println!("{} @ {}", item.id, item.position);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::core::campaign::CampaignWindow;
use crate::core::sequence::OrderedItem;
use crate::core::tree::CategoryNode;
use crate::core::types::{CollectionId, ItemId, NodeId, Slug};

/// Errors from store operations.
///
/// These error types map to common failure modes when talking to the
/// content store's admin API.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The node cannot be deleted while it has children.
    #[error("node not empty: {0}")]
    NotEmpty(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Request to create a category node.
#[derive(Debug, Clone)]
pub struct NodeDraft {
    /// Display name
    pub name: String,
    /// URL slug; derived from `name` by the caller when absent here
    pub slug: Slug,
    /// Visible/enabled flag
    pub active: bool,
    /// Campaign window, if the node starts out as a promotion
    pub campaign: Option<CampaignWindow>,
}

/// Partial update to a category node.
///
/// Outer `None` means "leave the field alone"; for the nullable fields
/// the inner `Option` carries the new value, with `Some(None)` clearing
/// it.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    /// New parent (`Some(None)` moves the node to the root)
    pub parent_id: Option<Option<NodeId>>,
    /// New display name
    pub name: Option<String>,
    /// New slug
    pub slug: Option<Slug>,
    /// New visible/enabled flag
    pub active: Option<bool>,
    /// New campaign window (`Some(None)` clears the campaign)
    pub campaign: Option<Option<CampaignWindow>>,
}

impl NodePatch {
    /// A patch that only moves the node.
    pub fn reparent(new_parent: Option<NodeId>) -> Self {
        Self {
            parent_id: Some(new_parent),
            ..Default::default()
        }
    }

    /// A patch that only flips the active flag.
    pub fn set_active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Default::default()
        }
    }

    /// A patch that only replaces (or clears) the campaign window.
    pub fn set_campaign(campaign: Option<CampaignWindow>) -> Self {
        Self {
            campaign: Some(campaign),
            ..Default::default()
        }
    }

    /// Whether the patch changes anything.
    pub fn is_empty(&self) -> bool {
        self.parent_id.is_none()
            && self.name.is_none()
            && self.slug.is_none()
            && self.active.is_none()
            && self.campaign.is_none()
    }
}

/// The ContentStore trait for the persistence service behind the admin
/// screens.
///
/// v1 implements the REST admin API; the mock implementation backs the
/// test suite.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, StoreError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: surface a credentials problem
/// - `NotFound`: the snapshot is stale; reload
/// - `NotEmpty`: the node still has children server-side
/// - `RateLimited`: back off and retry
/// - `ApiError` / `NetworkError`: report and reload truth
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Get the store name (e.g., "rest", "mock").
    fn name(&self) -> &'static str;

    /// List an ordered collection, in the store's authoritative order.
    async fn list(&self, collection: &CollectionId) -> Result<Vec<OrderedItem>, StoreError>;

    /// Persist a single item's position.
    ///
    /// Used by the per-item commit strategy, one call per item, issued
    /// strictly in the proposed order.
    async fn update_position(
        &self,
        collection: &CollectionId,
        item: &ItemId,
        position: u32,
    ) -> Result<(), StoreError>;

    /// Persist a full ordering in one call.
    ///
    /// The store applies positions `0..n-1` in exactly the order of
    /// `ordered`.
    async fn update_positions_batch(
        &self,
        collection: &CollectionId,
        ordered: &[ItemId],
    ) -> Result<(), StoreError>;

    /// Persist an item's active flag.
    async fn update_active(
        &self,
        collection: &CollectionId,
        item: &ItemId,
        active: bool,
    ) -> Result<(), StoreError>;

    /// Create a category node under `parent` (`None` = root).
    ///
    /// # Returns
    ///
    /// The created node with its store-assigned id.
    async fn create_node(
        &self,
        parent: Option<&NodeId>,
        draft: NodeDraft,
    ) -> Result<CategoryNode, StoreError>;

    /// Apply a partial update to a category node.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node doesn't exist
    /// - `ApiError` with status 422 if the store's own cycle check rejects
    ///   a reparent (the client's snapshot was stale)
    async fn update_node(&self, node: &NodeId, patch: NodePatch) -> Result<(), StoreError>;

    /// Delete a category node.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node doesn't exist
    /// - `NotEmpty` if the node has children (enforced by the store, not
    ///   this engine)
    async fn delete_node(&self, node: &NodeId) -> Result<(), StoreError>;

    /// Fetch the whole category forest, in the store's authoritative
    /// order.
    async fn fetch_tree(&self) -> Result<Vec<CategoryNode>, StoreError>;
}
