//! Single-item position allocation.
//!
//! # Invariants
//! - The returned key sorts strictly after the anchor and strictly before its
//!   successor, once `Allocation::rebalanced` has been persisted.
//! - Insert-first keys sort strictly before every entry.
//! - A missing anchor means "insert last", never an error.

use crate::model::bookmark::BookmarkId;
use crate::model::namespace::OrderEntry;
use crate::ordering::config::OrderingConfig;
use crate::ordering::rebalance::{changed_entries, rebalance};

/// Result of one allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Key for the moving item.
    pub order_key: i64,
    /// Existing entries whose keys must change first. Empty when the
    /// namespace had room.
    pub rebalanced: Vec<OrderEntry>,
}

impl Allocation {
    fn placed(order_key: i64) -> Self {
        Self {
            order_key,
            rebalanced: Vec::new(),
        }
    }
}

/// Computes a key placing one item after `after` (or first when `None`).
///
/// `entries` must be sorted ascending by key and must not contain the moving
/// item.
pub fn allocate(
    entries: &[OrderEntry],
    after: Option<BookmarkId>,
    config: &OrderingConfig,
) -> Allocation {
    let Some(after) = after else {
        return allocate_first(entries, config);
    };

    let Some(anchor_index) = entries.iter().position(|entry| entry.id == after) else {
        return append_allocation(entries, config);
    };

    let prev = entries[anchor_index].order_key;
    let Some(next) = entries.get(anchor_index + 1).map(|entry| entry.order_key) else {
        return append_allocation(entries, config);
    };

    if let Some(key) = midpoint(prev, next, config.min_gap()) {
        return Allocation::placed(key);
    }

    // Neighbors collapsed: respace everything, leaving one free slot after
    // the anchor for the moving item.
    let head = rebalance(
        &entries[..=anchor_index],
        config.rebalance_gap(),
        config.first_position(),
    );
    let order_key = head
        .last()
        .map_or(config.first_position(), |anchor| anchor.order_key)
        .saturating_add(config.rebalance_gap());
    let tail = rebalance(
        &entries[anchor_index + 1..],
        config.rebalance_gap(),
        order_key.saturating_add(config.rebalance_gap()),
    );
    let respaced = head.into_iter().chain(tail).collect();
    Allocation {
        order_key,
        rebalanced: changed_entries(entries, respaced),
    }
}

/// Key for appending one item after the last entry.
///
/// Used when creating bookmarks, which always land last in their namespace.
pub fn append_position(entries: &[OrderEntry], config: &OrderingConfig) -> Allocation {
    append_allocation(entries, config)
}

fn allocate_first(entries: &[OrderEntry], config: &OrderingConfig) -> Allocation {
    let Some(first) = entries.first().map(|entry| entry.order_key) else {
        return Allocation::placed(config.first_position());
    };

    if first > config.min_gap() {
        return Allocation::placed(first / 2);
    }

    let origin = config
        .first_position()
        .saturating_add(config.rebalance_gap());
    let respaced = rebalance(entries, config.rebalance_gap(), origin);
    Allocation {
        order_key: config.first_position(),
        rebalanced: changed_entries(entries, respaced),
    }
}

fn append_allocation(entries: &[OrderEntry], config: &OrderingConfig) -> Allocation {
    let Some(last) = entries.last().map(|entry| entry.order_key) else {
        return Allocation::placed(config.first_position());
    };

    if let Some(key) = last.checked_add(config.default_gap()) {
        return Allocation::placed(key);
    }

    // Key space exhausted at the top: restart the namespace at first_position.
    let respaced = rebalance(entries, config.rebalance_gap(), config.first_position());
    let tail = respaced
        .last()
        .map_or(config.first_position(), |entry| entry.order_key);
    Allocation {
        order_key: tail.saturating_add(config.default_gap()),
        rebalanced: changed_entries(entries, respaced),
    }
}

/// Midpoint of `prev..next` when the gap exceeds `min_gap`.
pub(crate) fn midpoint(prev: i64, next: i64, min_gap: i64) -> Option<i64> {
    let gap = i128::from(next) - i128::from(prev);
    if gap <= i128::from(min_gap) {
        return None;
    }
    i64::try_from(i128::from(prev) + gap / 2).ok()
}
