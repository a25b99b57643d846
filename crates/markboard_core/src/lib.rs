//! Core domain logic for the Markboard bookmark board.
//! This crate owns bookmark placement: order keys, rebalancing and moves.

pub mod db;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::bookmark::{Bookmark, BookmarkId, Collection, CollectionId, NewBookmark};
pub use model::namespace::{Namespace, OrderEntry};
pub use ordering::{ConfigError, OrderingConfig};
pub use repo::activity::{
    ActivityAction, ActivityRecord, ActivityRecorder, LogActivityRecorder, SqliteActivityRecorder,
};
pub use repo::board_repo::SqliteBoardRepository;
pub use repo::store::{BookmarkRepository, OrderingStore, StoreError, StoreResult};
pub use service::bookmark_service::{BookmarkService, BookmarkServiceError};
pub use service::ordering_service::{MoveOutcome, OrderingService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
