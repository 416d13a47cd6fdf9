//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ItemId`] - Identifier of an ordered content item
//! - [`NodeId`] - Identifier of a category node
//! - [`CollectionId`] - Identifier of an ordered collection
//! - [`Slug`] - URL-safe category slug
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Snapshot hash for divergence detection
//!
//! # Validation
//!
//! These types enforce validity at construction time. Identifiers are
//! assigned by the content store and never minted client-side, but their
//! shape is still checked on the way in so that a malformed wire value
//! cannot circulate through the engine.
//!
//! # Examples
//!
//! ```
//! use shelfwork::core::types::{ItemId, NodeId, Slug};
//!
//! // Valid constructions
//! let item = ItemId::new("blk_29481").unwrap();
//! let node = NodeId::new("cat_7").unwrap();
//! let slug = Slug::new("summer-sale").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(ItemId::new("").is_err());
//! assert!(Slug::new("Summer Sale").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::naming::slugify;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Validate an opaque store-assigned identifier.
///
/// Identifiers must be non-empty, at most 128 characters, and contain no
/// whitespace or control characters.
fn validate_identifier(id: &str) -> Result<(), TypeError> {
    if id.is_empty() {
        return Err(TypeError::InvalidIdentifier(
            "identifier cannot be empty".into(),
        ));
    }
    if id.len() > 128 {
        return Err(TypeError::InvalidIdentifier(format!(
            "identifier exceeds 128 characters ({})",
            id.len()
        )));
    }
    for c in id.chars() {
        if c.is_whitespace() {
            return Err(TypeError::InvalidIdentifier(
                "identifier cannot contain whitespace".into(),
            ));
        }
        if c.is_control() {
            return Err(TypeError::InvalidIdentifier(
                "identifier cannot contain control characters".into(),
            ));
        }
    }
    Ok(())
}

macro_rules! identifier_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new validated identifier.
            ///
            /// # Errors
            ///
            /// Returns `TypeError::InvalidIdentifier` if the value is empty,
            /// too long, or contains whitespace/control characters.
            pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
                let id = id.into();
                validate_identifier(&id)?;
                Ok(Self(id))
            }

            /// Get the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier_type! {
    /// Identifier of an item within an ordered collection.
    ///
    /// Assigned by the content store on creation; the engine only carries it.
    ///
    /// # Example
    ///
    /// ```
    /// use shelfwork::core::types::ItemId;
    ///
    /// let id = ItemId::new("blk_29481").unwrap();
    /// assert_eq!(id.as_str(), "blk_29481");
    /// assert!(ItemId::new("has space").is_err());
    /// ```
    ItemId
}

identifier_type! {
    /// Identifier of a node in the category hierarchy.
    NodeId
}

identifier_type! {
    /// Identifier of an ordered collection (a block list, an attribute set).
    CollectionId
}

/// A URL-safe category slug.
///
/// Slugs are lowercase ASCII alphanumerics separated by single hyphens:
/// - Cannot be empty
/// - Cannot start or end with `-`
/// - Cannot contain `--`
/// - At most 60 characters
///
/// # Example
///
/// ```
/// use shelfwork::core::types::Slug;
///
/// let slug = Slug::new("summer-sale-2026").unwrap();
/// assert_eq!(slug.as_str(), "summer-sale-2026");
///
/// // Derived from a display name
/// let derived = Slug::derive("Summer Sale!").unwrap();
/// assert_eq!(derived.as_str(), "summer-sale");
///
/// assert!(Slug::new("Summer Sale").is_err());
/// assert!(Slug::new("-leading").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Create a new validated slug.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSlug` if the value violates the slug rules.
    pub fn new(slug: impl Into<String>) -> Result<Self, TypeError> {
        let slug = slug.into();
        Self::validate(&slug)?;
        Ok(Self(slug))
    }

    /// Derive a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSlug` if the name contains no usable
    /// characters (e.g. it is all punctuation).
    pub fn derive(name: &str) -> Result<Self, TypeError> {
        Self::new(slugify(name))
    }

    /// Validate a slug.
    fn validate(slug: &str) -> Result<(), TypeError> {
        if slug.is_empty() {
            return Err(TypeError::InvalidSlug("slug cannot be empty".into()));
        }
        if slug.len() > 60 {
            return Err(TypeError::InvalidSlug(format!(
                "slug exceeds 60 characters ({})",
                slug.len()
            )));
        }
        if slug.starts_with('-') || slug.ends_with('-') {
            return Err(TypeError::InvalidSlug(
                "slug cannot start or end with '-'".into(),
            ));
        }
        if slug.contains("--") {
            return Err(TypeError::InvalidSlug("slug cannot contain '--'".into()));
        }
        for c in slug.chars() {
            if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
                return Err(TypeError::InvalidSlug(format!(
                    "slug cannot contain '{c}'"
                )));
            }
        }
        Ok(())
    }

    /// Get the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Slug {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp in RFC3339 format.
///
/// Campaign timestamps are carried as opaque instants: parsed once at the
/// wire boundary, compared as instants afterwards. No timezone
/// normalization happens beyond the parse.
///
/// # Example
///
/// ```
/// use shelfwork::core::types::UtcTimestamp;
///
/// let start = UtcTimestamp::parse("2026-06-01T00:00:00Z").unwrap();
/// let end = UtcTimestamp::parse("2026-06-15T00:00:00Z").unwrap();
/// assert!(start < end);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Parse an RFC3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTimestamp` if the string is not RFC3339.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&chrono::Utc)))
            .map_err(|e| TypeError::InvalidTimestamp(format!("{s}: {e}")))
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable hash over a confirmed snapshot for divergence detection.
///
/// The fingerprint lets a manager tell whether a refresh brought back the
/// sequence (or tree) it last confirmed, or whether out-of-band edits
/// landed in the store between operations.
///
/// # Example
///
/// ```
/// use shelfwork::core::types::{Fingerprint, ItemId};
///
/// let items = vec![
///     (ItemId::new("blk_1").unwrap(), 0),
///     (ItemId::new("blk_2").unwrap(), 1),
/// ];
///
/// let fp = Fingerprint::of_sequence(&items);
///
/// // Same order produces the same fingerprint
/// assert_eq!(fp, Fingerprint::of_sequence(&items));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint over an ordered sequence of (id, position) pairs.
    ///
    /// Order matters: the same ids in a different order produce a different
    /// fingerprint, since render order is exactly what the sequence encodes.
    pub fn of_sequence(items: &[(ItemId, u32)]) -> Self {
        let mut hasher = Sha256::new();
        for (id, position) in items {
            hasher.update(id.as_str().as_bytes());
            hasher.update(b"\0");
            hasher.update(position.to_be_bytes());
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Compute a fingerprint over a set of (child, parent) tree edges.
    ///
    /// Edges are sorted by child id before hashing so the result is
    /// independent of traversal order.
    pub fn of_edges(edges: &[(NodeId, Option<NodeId>)]) -> Self {
        let mut sorted: Vec<_> = edges.iter().collect();
        sorted.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

        let mut hasher = Sha256::new();
        for (child, parent) in sorted {
            hasher.update(child.as_str().as_bytes());
            hasher.update(b"\0");
            match parent {
                Some(p) => hasher.update(p.as_str().as_bytes()),
                None => hasher.update(b"~root~"),
            }
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod identifiers {
        use super::*;

        #[test]
        fn valid_identifiers() {
            assert!(ItemId::new("blk_1").is_ok());
            assert!(NodeId::new("cat-7").is_ok());
            assert!(CollectionId::new("home.blocks").is_ok());
            assert!(ItemId::new("29481").is_ok());
        }

        #[test]
        fn empty_rejected() {
            assert!(ItemId::new("").is_err());
            assert!(NodeId::new("").is_err());
        }

        #[test]
        fn whitespace_rejected() {
            assert!(ItemId::new("has space").is_err());
            assert!(ItemId::new("has\ttab").is_err());
        }

        #[test]
        fn control_chars_rejected() {
            assert!(NodeId::new("has\x07bell").is_err());
        }

        #[test]
        fn overlong_rejected() {
            let long = "x".repeat(129);
            assert!(ItemId::new(long).is_err());
            assert!(ItemId::new("x".repeat(128)).is_ok());
        }

        #[test]
        fn serde_roundtrip() {
            let id = ItemId::new("blk_42").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            let parsed: ItemId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, parsed);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<ItemId, _> = serde_json::from_str("\"has space\"");
            assert!(result.is_err());
        }
    }

    mod slug {
        use super::*;

        #[test]
        fn valid_slugs() {
            assert!(Slug::new("summer-sale").is_ok());
            assert!(Slug::new("tops").is_ok());
            assert!(Slug::new("fall-2026").is_ok());
            assert!(Slug::new("a").is_ok());
        }

        #[test]
        fn empty_rejected() {
            assert!(Slug::new("").is_err());
        }

        #[test]
        fn uppercase_rejected() {
            assert!(Slug::new("Summer").is_err());
        }

        #[test]
        fn spaces_rejected() {
            assert!(Slug::new("summer sale").is_err());
        }

        #[test]
        fn leading_trailing_hyphen_rejected() {
            assert!(Slug::new("-sale").is_err());
            assert!(Slug::new("sale-").is_err());
        }

        #[test]
        fn double_hyphen_rejected() {
            assert!(Slug::new("summer--sale").is_err());
        }

        #[test]
        fn overlong_rejected() {
            assert!(Slug::new("a".repeat(61)).is_err());
            assert!(Slug::new("a".repeat(60)).is_ok());
        }

        #[test]
        fn derive_from_name() {
            assert_eq!(Slug::derive("Summer Sale!").unwrap().as_str(), "summer-sale");
            assert_eq!(Slug::derive("Tops & Tees").unwrap().as_str(), "tops-tees");
        }

        #[test]
        fn derive_all_punctuation_fails() {
            assert!(Slug::derive("!!!").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let slug = Slug::new("summer-sale").unwrap();
            let json = serde_json::to_string(&slug).unwrap();
            let parsed: Slug = serde_json::from_str(&json).unwrap();
            assert_eq!(slug, parsed);
        }
    }

    mod utc_timestamp {
        use super::*;

        #[test]
        fn parse_rfc3339() {
            let ts = UtcTimestamp::parse("2026-06-01T00:00:00Z").unwrap();
            assert!(ts.to_string().starts_with("2026-06-01"));
        }

        #[test]
        fn parse_with_offset_normalizes_to_utc() {
            let ts = UtcTimestamp::parse("2026-06-01T02:00:00+02:00").unwrap();
            assert_eq!(ts, UtcTimestamp::parse("2026-06-01T00:00:00Z").unwrap());
        }

        #[test]
        fn garbage_rejected() {
            assert!(UtcTimestamp::parse("next tuesday").is_err());
            assert!(UtcTimestamp::parse("").is_err());
        }

        #[test]
        fn ordering() {
            let a = UtcTimestamp::parse("2026-06-01T00:00:00Z").unwrap();
            let b = UtcTimestamp::parse("2026-06-15T00:00:00Z").unwrap();
            assert!(a < b);
            assert!(b > a);
        }

        #[test]
        fn serde_roundtrip() {
            let ts = UtcTimestamp::parse("2026-06-01T00:00:00Z").unwrap();
            let json = serde_json::to_string(&ts).unwrap();
            let parsed: UtcTimestamp = serde_json::from_str(&json).unwrap();
            assert_eq!(ts, parsed);
        }
    }

    mod fingerprint {
        use super::*;

        fn pairs(ids: &[&str]) -> Vec<(ItemId, u32)> {
            ids.iter()
                .enumerate()
                .map(|(i, id)| (ItemId::new(*id).unwrap(), i as u32))
                .collect()
        }

        #[test]
        fn sequence_deterministic() {
            let items = pairs(&["blk_1", "blk_2", "blk_3"]);
            assert_eq!(
                Fingerprint::of_sequence(&items),
                Fingerprint::of_sequence(&items)
            );
        }

        #[test]
        fn sequence_order_sensitive() {
            let fwd = pairs(&["blk_1", "blk_2"]);
            let rev = pairs(&["blk_2", "blk_1"]);
            assert_ne!(
                Fingerprint::of_sequence(&fwd),
                Fingerprint::of_sequence(&rev)
            );
        }

        #[test]
        fn edges_order_independent() {
            let a = NodeId::new("a").unwrap();
            let b = NodeId::new("b").unwrap();
            let edges1 = vec![(a.clone(), None), (b.clone(), Some(a.clone()))];
            let edges2 = vec![(b.clone(), Some(a.clone())), (a.clone(), None)];
            assert_eq!(Fingerprint::of_edges(&edges1), Fingerprint::of_edges(&edges2));
        }

        #[test]
        fn edges_parent_sensitive() {
            let a = NodeId::new("a").unwrap();
            let b = NodeId::new("b").unwrap();
            let rooted = vec![(b.clone(), None)];
            let childed = vec![(b.clone(), Some(a.clone()))];
            assert_ne!(
                Fingerprint::of_edges(&rooted),
                Fingerprint::of_edges(&childed)
            );
        }

        #[test]
        fn empty_sequence() {
            let fp = Fingerprint::of_sequence(&[]);
            assert!(!fp.as_str().is_empty());
        }
    }
}
