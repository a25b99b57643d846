//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the ordering store contract consumed by the move executors.
//! - Define bookmark/collection persistence used by creation use-cases.
//! - Isolate SQL and the nullable-collection encoding of namespaces.
//!
//! # Invariants
//! - Namespace snapshots are ordered `sort_order ASC, created_at DESC,
//!   uuid ASC`, so ties are resolved deterministically.
//! - Store errors carry transport failures and semantic misses
//!   (`ItemNotFound`) without retrying.

pub mod activity;
pub mod board_repo;
pub mod store;
