//! core::sequence
//!
//! Ordered sequences of content items and the gapless renumbering rules.
//!
//! # Invariants
//!
//! Within one sequence, `position` values are unique, contiguous
//! (`0..n-1`), and reflect render order. Every operation in this module
//! re-derives positions from array order; positions supplied by a caller
//! are never trusted past [`normalize`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use shelfwork::core::sequence::{move_item, OrderedItem};
//! use shelfwork::core::types::ItemId;
//!
//! let items = vec![
//!     OrderedItem::new(ItemId::new("1").unwrap(), 0, true, json!({})),
//!     OrderedItem::new(ItemId::new("2").unwrap(), 1, true, json!({})),
//!     OrderedItem::new(ItemId::new("3").unwrap(), 2, true, json!({})),
//! ];
//!
//! let moved = move_item(&items, &ItemId::new("3").unwrap(), 0).unwrap();
//! let order: Vec<&str> = moved.iter().map(|i| i.id.as_str()).collect();
//! assert_eq!(order, ["3", "1", "2"]);
//! assert_eq!(moved[0].position, 0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Fingerprint, ItemId};

/// Errors from sequence operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// The referenced item is not in the working copy.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),
}

/// A record participating in an ordered sequence.
///
/// The `payload` carries whatever type-specific fields the screen needs;
/// the engine never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedItem {
    /// Store-assigned identifier.
    pub id: ItemId,
    /// Dense 0-based rank within the sequence.
    pub position: u32,
    /// Visible/enabled flag, independent of position.
    pub active: bool,
    /// Opaque type-specific fields.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl OrderedItem {
    /// Create a new ordered item.
    pub fn new(id: ItemId, position: u32, active: bool, payload: serde_json::Value) -> Self {
        Self {
            id,
            position,
            active,
            payload,
        }
    }
}

/// Re-derive every item's position as its array index.
///
/// This is the gapless renumbering rule: after any insert, remove, or
/// move, positions are exactly `0..n-1` in array order.
pub fn normalize(items: &mut [OrderedItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.position = index as u32;
    }
}

/// Check whether positions already equal array indices.
pub fn is_normalized(items: &[OrderedItem]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.position == index as u32)
}

/// Find the array index of an item by id.
pub fn index_of(items: &[OrderedItem], id: &ItemId) -> Option<usize> {
    items.iter().position(|item| &item.id == id)
}

/// Compute a new ordering by moving `id` to `target_index`.
///
/// The item is removed and reinserted at `target_index` (clamped into
/// `[0, len-1]`), then every position is re-derived from array order.
/// The input is not modified; the proposed sequence is returned for the
/// caller to commit.
///
/// # Errors
///
/// Returns `SequenceError::UnknownItem` if `id` is not present.
pub fn move_item(
    items: &[OrderedItem],
    id: &ItemId,
    target_index: usize,
) -> Result<Vec<OrderedItem>, SequenceError> {
    let from = index_of(items, id).ok_or_else(|| SequenceError::UnknownItem(id.clone()))?;

    let mut proposed = items.to_vec();
    let item = proposed.remove(from);
    let target = target_index.min(proposed.len());
    proposed.insert(target, item);
    normalize(&mut proposed);
    Ok(proposed)
}

/// Fingerprint a sequence for divergence detection.
pub fn fingerprint(items: &[OrderedItem]) -> Fingerprint {
    let pairs: Vec<(ItemId, u32)> = items
        .iter()
        .map(|item| (item.id.clone(), item.position))
        .collect();
    Fingerprint::of_sequence(&pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str, position: u32) -> OrderedItem {
        OrderedItem::new(ItemId::new(id).unwrap(), position, true, json!({}))
    }

    fn seq(ids: &[&str]) -> Vec<OrderedItem> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| item(id, i as u32))
            .collect()
    }

    fn order(items: &[OrderedItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    mod normalize {
        use super::*;

        #[test]
        fn renumbers_from_zero() {
            let mut items = vec![item("a", 7), item("b", 3), item("c", 3)];
            normalize(&mut items);
            assert_eq!(
                items.iter().map(|i| i.position).collect::<Vec<_>>(),
                vec![0, 1, 2]
            );
        }

        #[test]
        fn empty_is_fine() {
            let mut items: Vec<OrderedItem> = vec![];
            normalize(&mut items);
            assert!(items.is_empty());
        }

        #[test]
        fn is_normalized_detects_gaps() {
            assert!(is_normalized(&seq(&["a", "b", "c"])));
            let gapped = vec![item("a", 0), item("b", 2)];
            assert!(!is_normalized(&gapped));
        }
    }

    mod move_item {
        use super::*;

        #[test]
        fn move_to_front() {
            // Sequence [{1,0},{2,1},{3,2}], move(3, 0) -> [{3,0},{1,1},{2,2}]
            let items = seq(&["1", "2", "3"]);
            let moved = move_item(&items, &ItemId::new("3").unwrap(), 0).unwrap();
            assert_eq!(order(&moved), ["3", "1", "2"]);
            assert_eq!(
                moved.iter().map(|i| i.position).collect::<Vec<_>>(),
                vec![0, 1, 2]
            );
        }

        #[test]
        fn move_to_end() {
            let items = seq(&["a", "b", "c"]);
            let moved = move_item(&items, &ItemId::new("a").unwrap(), 2).unwrap();
            assert_eq!(order(&moved), ["b", "c", "a"]);
        }

        #[test]
        fn move_to_middle() {
            let items = seq(&["a", "b", "c", "d"]);
            let moved = move_item(&items, &ItemId::new("d").unwrap(), 1).unwrap();
            assert_eq!(order(&moved), ["a", "d", "b", "c"]);
        }

        #[test]
        fn target_index_clamped() {
            let items = seq(&["a", "b", "c"]);
            let moved = move_item(&items, &ItemId::new("a").unwrap(), 99).unwrap();
            assert_eq!(order(&moved), ["b", "c", "a"]);
        }

        #[test]
        fn move_to_current_index_is_identity() {
            let items = seq(&["a", "b", "c"]);
            let moved = move_item(&items, &ItemId::new("b").unwrap(), 1).unwrap();
            assert_eq!(order(&moved), order(&items));
            assert_eq!(moved, items);
        }

        #[test]
        fn unknown_item_rejected() {
            let items = seq(&["a", "b"]);
            let err = move_item(&items, &ItemId::new("zzz").unwrap(), 0).unwrap_err();
            assert_eq!(err, SequenceError::UnknownItem(ItemId::new("zzz").unwrap()));
        }

        #[test]
        fn input_not_mutated() {
            let items = seq(&["a", "b", "c"]);
            let before = items.clone();
            let _ = move_item(&items, &ItemId::new("c").unwrap(), 0).unwrap();
            assert_eq!(items, before);
        }

        #[test]
        fn single_item_sequence() {
            let items = seq(&["only"]);
            let moved = move_item(&items, &ItemId::new("only").unwrap(), 5).unwrap();
            assert_eq!(order(&moved), ["only"]);
            assert_eq!(moved[0].position, 0);
        }

        #[test]
        fn preserves_payload_and_active() {
            let mut items = seq(&["a", "b"]);
            items[1].active = false;
            items[1].payload = json!({"kind": "banner"});
            let moved = move_item(&items, &ItemId::new("b").unwrap(), 0).unwrap();
            assert!(!moved[0].active);
            assert_eq!(moved[0].payload, json!({"kind": "banner"}));
        }
    }

    mod fingerprint {
        use super::*;

        #[test]
        fn reorder_changes_fingerprint() {
            let items = seq(&["a", "b", "c"]);
            let moved = move_item(&items, &ItemId::new("c").unwrap(), 0).unwrap();
            assert_ne!(fingerprint(&items), fingerprint(&moved));
        }

        #[test]
        fn identity_move_keeps_fingerprint() {
            let items = seq(&["a", "b", "c"]);
            let moved = move_item(&items, &ItemId::new("b").unwrap(), 1).unwrap();
            assert_eq!(fingerprint(&items), fingerprint(&moved));
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn item_roundtrip() {
            let original = OrderedItem::new(
                ItemId::new("blk_1").unwrap(),
                3,
                false,
                json!({"title": "Hero", "image": "hero.webp"}),
            );
            let text = serde_json::to_string(&original).unwrap();
            let parsed: OrderedItem = serde_json::from_str(&text).unwrap();
            assert_eq!(original, parsed);
        }

        #[test]
        fn missing_payload_defaults_to_null() {
            let parsed: OrderedItem =
                serde_json::from_str(r#"{"id":"blk_1","position":0,"active":true}"#).unwrap();
            assert_eq!(parsed.payload, serde_json::Value::Null);
        }
    }
}
