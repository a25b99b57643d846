//! Store contracts shared by the ordering executors.

use crate::db::DbError;
use crate::model::bookmark::{Bookmark, BookmarkId, Collection, CollectionId, NewBookmark};
use crate::model::namespace::{Namespace, OrderEntry};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from reading or writing board storage.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Position update targeted a bookmark that does not exist.
    ItemNotFound(BookmarkId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Failure reported by a non-SQLite store implementation.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "board store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
            Self::Backend(message) => write!(f, "store backend failure: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ordered key access for one namespace at a time.
pub trait OrderingStore {
    /// Lists `(id, key)` pairs of `namespace` in display order.
    fn list_order_keys(&self, namespace: &Namespace) -> StoreResult<Vec<OrderEntry>>;

    /// Atomically sets one bookmark's namespace and key.
    ///
    /// Returns `StoreError::ItemNotFound` when no bookmark has `item_id`.
    fn set_position(
        &self,
        item_id: BookmarkId,
        namespace: &Namespace,
        order_key: i64,
    ) -> StoreResult<()>;

    /// Runs `work` isolated from other writers of `namespace`.
    ///
    /// When `work` fails, implementations that can roll back must discard
    /// every write `work` made.
    fn atomically<T, F>(&self, namespace: &Namespace, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>;
}

/// Bookmark and collection persistence for creation/listing use-cases.
pub trait BookmarkRepository {
    /// Creates one collection with an already normalized name.
    fn create_collection(&self, name: &str) -> StoreResult<Collection>;
    /// Loads one collection by id.
    fn get_collection(&self, id: CollectionId) -> StoreResult<Option<Collection>>;
    /// Inserts one bookmark with its precomputed key.
    fn insert_bookmark(&self, bookmark: &NewBookmark) -> StoreResult<Bookmark>;
    /// Loads one bookmark by id.
    fn get_bookmark(&self, id: BookmarkId) -> StoreResult<Option<Bookmark>>;
    /// Lists bookmarks of one namespace in display order.
    fn list_bookmarks(&self, namespace: &Namespace) -> StoreResult<Vec<Bookmark>>;
    /// Removes one bookmark, leaving a hole in its namespace.
    fn delete_bookmark(&self, id: BookmarkId) -> StoreResult<()>;
}
