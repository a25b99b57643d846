//! Domain model for the bookmark board.
//!
//! # Responsibility
//! - Define bookmark/collection records used by repositories and services.
//! - Define the ordering namespace and the `(id, order key)` pair the
//!   ordering engine works on.
//!
//! # Invariants
//! - Every bookmark and collection is identified by a stable UUID.
//! - Order keys are only comparable inside one namespace.

pub mod bookmark;
pub mod namespace;
