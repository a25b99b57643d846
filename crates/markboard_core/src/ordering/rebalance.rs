//! Uniform respacing of a namespace.

use crate::model::namespace::OrderEntry;

/// Reassigns keys `start_at + i * gap` to `entries`, keeping their order.
///
/// Arithmetic saturates at `i64::MAX` instead of wrapping, so an absurdly
/// large namespace degrades into ties rather than reordering.
pub fn rebalance(entries: &[OrderEntry], gap: i64, start_at: i64) -> Vec<OrderEntry> {
    let mut key = start_at;
    entries
        .iter()
        .map(|entry| {
            let respaced = OrderEntry::new(entry.id, key);
            key = key.saturating_add(gap);
            respaced
        })
        .collect()
}

/// Keeps only the respaced entries whose key differs from `before`, in write
/// order.
///
/// Write order is: entries whose key shrinks, left to right, then entries
/// whose key grows, right to left. Applying any prefix of the result keeps
/// the namespace sorted, so an interrupted write never reorders items.
/// `before` and `after` must describe the same ids in the same order.
pub fn changed_entries(before: &[OrderEntry], after: Vec<OrderEntry>) -> Vec<OrderEntry> {
    let mut shrinking = Vec::new();
    let mut growing = Vec::new();
    for (respaced, original) in after.into_iter().zip(before) {
        if respaced.order_key < original.order_key {
            shrinking.push(respaced);
        } else if respaced.order_key > original.order_key {
            growing.push(respaced);
        }
    }
    shrinking.extend(growing.into_iter().rev());
    shrinking
}
