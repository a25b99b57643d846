//! Ordering namespaces and order entries.
//!
//! # Invariants
//! - `Namespace::Unsorted` is the only namespace without a collection id.
//! - A namespace snapshot (`&[OrderEntry]`) is sorted ascending by
//!   `order_key`; callers producing one must keep that order.

use crate::model::bookmark::{BookmarkId, CollectionId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Partition key that owns one ordering sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "collection_id")]
pub enum Namespace {
    /// Implicit group of bookmarks without a collection.
    Unsorted,
    /// User-defined collection.
    Collection(CollectionId),
}

impl Namespace {
    /// Maps the nullable storage/wire representation to a namespace.
    pub fn from_collection(collection_id: Option<CollectionId>) -> Self {
        collection_id.map_or(Self::Unsorted, Self::Collection)
    }

    /// Returns the collection id, `None` for the unsorted namespace.
    pub fn collection_id(&self) -> Option<CollectionId> {
        match self {
            Self::Unsorted => None,
            Self::Collection(id) => Some(*id),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsorted => write!(f, "unsorted"),
            Self::Collection(id) => write!(f, "collection:{id}"),
        }
    }
}

/// One item of a namespace snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub id: BookmarkId,
    pub order_key: i64,
}

impl OrderEntry {
    pub fn new(id: BookmarkId, order_key: i64) -> Self {
        Self { id, order_key }
    }
}
