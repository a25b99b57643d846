//! Bookmark and collection records.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `sort_order` is meaningful only relative to bookmarks in the same
//!   `namespace`.
//! - Timestamps are Unix epoch milliseconds assigned by storage.

use crate::model::namespace::Namespace;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable bookmark identifier.
pub type BookmarkId = Uuid;

/// Stable collection identifier.
pub type CollectionId = Uuid;

/// Bookmark read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub url: String,
    pub title: String,
    /// Group that owns this bookmark's position.
    pub namespace: Namespace,
    /// Ascending display key within `namespace`.
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert model for one bookmark.
///
/// Storage assigns timestamps; the service assigns `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub id: BookmarkId,
    pub url: String,
    pub title: String,
    pub namespace: Namespace,
    pub sort_order: i64,
}

impl NewBookmark {
    /// Creates an insert model with a generated id.
    pub fn new(
        namespace: Namespace,
        url: impl Into<String>,
        title: impl Into<String>,
        sort_order: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            title: title.into(),
            namespace,
            sort_order,
        }
    }
}

/// User-defined collection. Collections are flat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub created_at: i64,
}
