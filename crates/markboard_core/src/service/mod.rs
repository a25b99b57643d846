//! Board use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads, ordering plans and store writes.
//! - Keep the HTTP/UI layer decoupled from storage and key arithmetic.

pub mod bookmark_service;
pub mod ordering_service;
