//! Batch placement for bulk moves.
//!
//! A batch is placed with one computation for the whole insertion point, so
//! the anchor never goes stale between items. Inside a gap the batch is spread
//! evenly (`gap / (n + 1)`), which is the single-item midpoint when `n == 1`.
//! Appends and rebalance overflow use fixed `default_gap` steps.
//!
//! # Invariants
//! - Assigned keys follow the batch's input order and are strictly
//!   increasing.
//! - All assigned keys sort after the anchor and before its successor once
//!   `BulkPlan::rebalanced` has been persisted.

use crate::model::bookmark::BookmarkId;
use crate::model::namespace::OrderEntry;
use crate::ordering::config::OrderingConfig;
use crate::ordering::rebalance::{changed_entries, rebalance};

/// Placement computed for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkPlan {
    /// New key per batch item, in input order.
    pub assignments: Vec<OrderEntry>,
    /// Existing entries to respace before the batch is written.
    pub rebalanced: Vec<OrderEntry>,
}

/// Plans the placement of `batch` after `after` (or first when `None`).
///
/// `entries` must be sorted ascending and exclude every batch id; `batch`
/// must not contain duplicates.
pub fn plan_bulk(
    entries: &[OrderEntry],
    batch: &[BookmarkId],
    after: Option<BookmarkId>,
    config: &OrderingConfig,
) -> BulkPlan {
    if batch.is_empty() {
        return BulkPlan::default();
    }

    let anchor_index = match after {
        None => return plan_first(entries, batch, config),
        Some(after) => entries.iter().position(|entry| entry.id == after),
    };

    match anchor_index {
        Some(index) if index + 1 < entries.len() => plan_between(entries, index, batch, config),
        _ => plan_append(entries, batch, config),
    }
}

fn plan_first(entries: &[OrderEntry], batch: &[BookmarkId], config: &OrderingConfig) -> BulkPlan {
    let Some(first) = entries.first().map(|entry| entry.order_key) else {
        return plan_append(entries, batch, config);
    };

    let needed = batch_len(batch).checked_mul(config.default_gap());
    let start = needed.and_then(|needed| first.checked_sub(needed));
    if let Some(start) = start.filter(|start| *start >= config.min_gap()) {
        if let Some(keys) = sequence(start, config.default_gap(), batch.len()) {
            return BulkPlan {
                assignments: assign(batch, keys),
                rebalanced: Vec::new(),
            };
        }
    }

    let origin = batch_len(batch)
        .saturating_mul(config.default_gap())
        .saturating_add(config.first_position());
    let respaced = rebalance(entries, config.rebalance_gap(), origin);
    match sequence(config.first_position(), config.default_gap(), batch.len()) {
        Some(keys) => BulkPlan {
            assignments: assign(batch, keys),
            rebalanced: changed_entries(entries, respaced),
        },
        None => restart(entries, 0, batch, config),
    }
}

fn plan_between(
    entries: &[OrderEntry],
    anchor_index: usize,
    batch: &[BookmarkId],
    config: &OrderingConfig,
) -> BulkPlan {
    let prev = entries[anchor_index].order_key;
    let next = entries[anchor_index + 1].order_key;
    let n = i128::from(batch_len(batch));
    let gap = i128::from(next) - i128::from(prev);
    let step = gap / (n + 1);

    if step >= 1 && gap > n * i128::from(config.min_gap()) {
        // step * (n + 1) <= gap, so every key stays strictly below `next`.
        let keys = (1..=n)
            .map(|offset| i64::try_from(i128::from(prev) + step * offset))
            .collect::<Result<Vec<_>, _>>();
        if let Ok(keys) = keys {
            return BulkPlan {
                assignments: assign(batch, keys),
                rebalanced: Vec::new(),
            };
        }
    }

    let start = prev.checked_add(config.default_gap());
    let keys = start.and_then(|start| sequence(start, config.default_gap(), batch.len()));
    let tail_origin = keys
        .as_ref()
        .and_then(|keys| keys.last())
        .and_then(|last| last.checked_add(config.default_gap()));
    let (Some(keys), Some(tail_origin)) = (keys, tail_origin) else {
        return restart(entries, anchor_index + 1, batch, config);
    };

    let tail = &entries[anchor_index + 1..];
    let respaced = rebalance(tail, config.rebalance_gap(), tail_origin);
    BulkPlan {
        assignments: assign(batch, keys),
        rebalanced: changed_entries(tail, respaced),
    }
}

fn plan_append(entries: &[OrderEntry], batch: &[BookmarkId], config: &OrderingConfig) -> BulkPlan {
    let start = match entries.last() {
        Some(last) => last.order_key.checked_add(config.default_gap()),
        None => Some(config.first_position()),
    };
    match start.and_then(|start| sequence(start, config.default_gap(), batch.len())) {
        Some(keys) => BulkPlan {
            assignments: assign(batch, keys),
            rebalanced: Vec::new(),
        },
        None => restart(entries, entries.len(), batch, config),
    }
}

/// Respaces the whole namespace from `first_position` with the batch spliced
/// in at `insert_index`. Used only when keys would overflow `i64`.
fn restart(
    entries: &[OrderEntry],
    insert_index: usize,
    batch: &[BookmarkId],
    config: &OrderingConfig,
) -> BulkPlan {
    let mut cursor = config.first_position();
    let mut respaced = Vec::with_capacity(entries.len());
    let mut assignments = Vec::with_capacity(batch.len());

    for entry in &entries[..insert_index] {
        respaced.push(OrderEntry::new(entry.id, cursor));
        cursor = cursor.saturating_add(config.rebalance_gap());
    }
    for id in batch {
        assignments.push(OrderEntry::new(*id, cursor));
        cursor = cursor.saturating_add(config.default_gap());
    }
    for entry in &entries[insert_index..] {
        respaced.push(OrderEntry::new(entry.id, cursor));
        cursor = cursor.saturating_add(config.rebalance_gap());
    }

    BulkPlan {
        assignments,
        rebalanced: changed_entries(entries, respaced),
    }
}

fn sequence(start: i64, step: i64, len: usize) -> Option<Vec<i64>> {
    let mut keys = Vec::with_capacity(len);
    let mut key = start;
    for index in 0..len {
        if index > 0 {
            key = key.checked_add(step)?;
        }
        keys.push(key);
    }
    Some(keys)
}

fn assign(batch: &[BookmarkId], keys: Vec<i64>) -> Vec<OrderEntry> {
    batch
        .iter()
        .zip(keys)
        .map(|(id, key)| OrderEntry::new(*id, key))
        .collect()
}

fn batch_len(batch: &[BookmarkId]) -> i64 {
    i64::try_from(batch.len()).unwrap_or(i64::MAX)
}
