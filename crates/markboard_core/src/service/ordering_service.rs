//! Move and bulk-move executors.
//!
//! # Responsibility
//! - Relocate one bookmark, or an ordered batch, to a namespace position.
//! - Persist rebalance side effects before the moved items.
//!
//! # Invariants
//! - Each call runs read -> plan -> write inside one `OrderingStore::atomically`
//!   scope for the target namespace.
//! - A missing anchor appends; it is never reported as an error.
//! - Store failures are returned unchanged and never retried here.

use crate::model::bookmark::BookmarkId;
use crate::model::namespace::{Namespace, OrderEntry};
use crate::ordering::{allocate, plan_bulk, OrderingConfig};
use crate::repo::activity::{ActivityRecord, ActivityRecorder, LogActivityRecorder};
use crate::repo::store::{OrderingStore, StoreResult};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::time::Instant;

/// Keys written by one move call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Moved items with their new keys, in placement order.
    pub assigned: Vec<OrderEntry>,
    /// Number of existing entries respaced as a side effect.
    pub rebalanced: usize,
}

/// Executors for drag-and-drop reordering.
pub struct OrderingService<S: OrderingStore, A: ActivityRecorder = LogActivityRecorder> {
    store: S,
    activity: A,
    config: OrderingConfig,
}

impl<S: OrderingStore> OrderingService<S> {
    /// Creates a service with default tuning and log-only activity records.
    pub fn new(store: S) -> Self {
        Self {
            store,
            activity: LogActivityRecorder,
            config: OrderingConfig::default(),
        }
    }
}

impl<S: OrderingStore, A: ActivityRecorder> OrderingService<S, A> {
    /// Creates a service with explicit tuning and activity sink.
    pub fn with_config(store: S, activity: A, config: OrderingConfig) -> Self {
        Self {
            store,
            activity,
            config,
        }
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Moves one bookmark after `after` in `target` (first when `None`).
    ///
    /// Reordering inside the bookmark's current namespace goes through the
    /// same path as a cross-namespace move.
    pub fn move_item(
        &self,
        item_id: BookmarkId,
        target: Namespace,
        after: Option<BookmarkId>,
    ) -> StoreResult<MoveOutcome> {
        let started_at = Instant::now();
        let result = self.store.atomically(&target, |store| {
            let mut entries = store.list_order_keys(&target)?;
            entries.retain(|entry| entry.id != item_id);

            let allocation = allocate(&entries, after, &self.config);
            persist_rebalance(store, &target, &allocation.rebalanced)?;
            store.set_position(item_id, &target, allocation.order_key)?;

            Ok(MoveOutcome {
                assigned: vec![OrderEntry::new(item_id, allocation.order_key)],
                rebalanced: allocation.rebalanced.len(),
            })
        });

        match &result {
            Ok(outcome) => info!(
                "event=bookmark_move module=ordering status=ok namespace={target} rebalanced={} duration_ms={}",
                outcome.rebalanced,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=bookmark_move module=ordering status=error namespace={target} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    /// Moves an ordered batch after `after` in `target` (first when `None`).
    ///
    /// The batch keeps its input order; duplicate ids keep their first
    /// occurrence. An anchor that belongs to the batch counts as missing.
    pub fn bulk_move(
        &self,
        item_ids: &[BookmarkId],
        target: Namespace,
        after: Option<BookmarkId>,
    ) -> StoreResult<MoveOutcome> {
        let batch = dedup_preserving_order(item_ids);
        if batch.is_empty() {
            return Ok(MoveOutcome::default());
        }

        let started_at = Instant::now();
        let result = self.store.atomically(&target, |store| {
            let members: HashSet<BookmarkId> = batch.iter().copied().collect();
            let entries: Vec<OrderEntry> = store
                .list_order_keys(&target)?
                .into_iter()
                .filter(|entry| !members.contains(&entry.id))
                .collect();

            let plan = plan_bulk(&entries, &batch, after, &self.config);
            persist_rebalance(store, &target, &plan.rebalanced)?;
            for assignment in &plan.assignments {
                store.set_position(assignment.id, &target, assignment.order_key)?;
            }

            Ok(MoveOutcome {
                rebalanced: plan.rebalanced.len(),
                assigned: plan.assignments,
            })
        });

        match &result {
            Ok(outcome) => {
                info!(
                    "event=bookmark_bulk_move module=ordering status=ok namespace={target} count={} rebalanced={} duration_ms={}",
                    outcome.assigned.len(),
                    outcome.rebalanced,
                    started_at.elapsed().as_millis()
                );
                let record = ActivityRecord::bulk_move(target, batch);
                if let Err(err) = self.activity.record(&record) {
                    warn!(
                        "event=activity module=ordering status=error action={} error={err}",
                        record.action
                    );
                }
            }
            Err(err) => error!(
                "event=bookmark_bulk_move module=ordering status=error namespace={target} count={} duration_ms={} error={err}",
                batch.len(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

fn persist_rebalance<S: OrderingStore>(
    store: &S,
    namespace: &Namespace,
    rebalanced: &[OrderEntry],
) -> StoreResult<()> {
    if rebalanced.is_empty() {
        return Ok(());
    }
    debug!(
        "event=namespace_rebalance module=ordering status=start namespace={namespace} count={}",
        rebalanced.len()
    );
    // Entries arrive in write order: any applied prefix keeps the order valid.
    for entry in rebalanced {
        store.set_position(entry.id, namespace, entry.order_key)?;
    }
    Ok(())
}

fn dedup_preserving_order(item_ids: &[BookmarkId]) -> Vec<BookmarkId> {
    let mut seen = HashSet::with_capacity(item_ids.len());
    item_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
