//! Position allocation and rebalancing engine.
//!
//! # Responsibility
//! - Compute order keys for single and batched inserts into one namespace.
//! - Respace a namespace when the numeric room between neighbors runs out.
//!
//! # Invariants
//! - Everything in this module is pure: no I/O, no clock, no globals.
//! - Input snapshots are sorted ascending and exclude the moving item(s).
//! - Produced plans never reorder existing entries; they only respace them.

pub mod allocator;
pub mod bulk;
pub mod config;
pub mod rebalance;

pub use allocator::{allocate, append_position, Allocation};
pub use bulk::{plan_bulk, BulkPlan};
pub use config::{ConfigError, OrderingConfig};
pub use rebalance::{changed_entries, rebalance};
