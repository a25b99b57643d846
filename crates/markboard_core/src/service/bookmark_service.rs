//! Bookmark creation and listing use-cases.
//!
//! # Responsibility
//! - Validate user input for collections and bookmarks.
//! - Place new bookmarks last in their namespace.
//!
//! # Invariants
//! - Titles and collection names are trimmed and never blank.
//! - URLs are absolute `http`/`https` without whitespace.
//! - The "append last" key is computed in the same store transaction as the
//!   insert.

use crate::model::bookmark::{Bookmark, BookmarkId, Collection, CollectionId, NewBookmark};
use crate::model::namespace::Namespace;
use crate::ordering::{append_position, OrderingConfig};
use crate::repo::store::{BookmarkRepository, OrderingStore, StoreError};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:https?)://\S+$").expect("valid url regex"));

/// Errors from bookmark use-cases.
#[derive(Debug)]
pub enum BookmarkServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Collection name is blank after trim.
    InvalidName,
    /// URL is not an absolute http(s) URL.
    InvalidUrl(String),
    /// Target collection does not exist.
    CollectionNotFound(CollectionId),
    /// Bookmark does not exist.
    BookmarkNotFound(BookmarkId),
    /// Store-level failure.
    Store(StoreError),
}

impl Display for BookmarkServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "bookmark title must not be blank"),
            Self::InvalidName => write!(f, "collection name must not be blank"),
            Self::InvalidUrl(url) => write!(f, "invalid bookmark url: `{url}`"),
            Self::CollectionNotFound(id) => write!(f, "collection not found: {id}"),
            Self::BookmarkNotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookmarkServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for BookmarkServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ItemNotFound(id) => Self::BookmarkNotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Bookmark service facade.
pub struct BookmarkService<R: BookmarkRepository + OrderingStore> {
    repo: R,
    config: OrderingConfig,
}

impl<R: BookmarkRepository + OrderingStore> BookmarkService<R> {
    /// Creates service with default ordering tuning.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            config: OrderingConfig::default(),
        }
    }

    /// Creates service with explicit ordering tuning.
    pub fn with_config(repo: R, config: OrderingConfig) -> Self {
        Self { repo, config }
    }

    /// Creates one collection.
    pub fn create_collection(
        &self,
        name: impl Into<String>,
    ) -> Result<Collection, BookmarkServiceError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(BookmarkServiceError::InvalidName);
        }
        Ok(self.repo.create_collection(trimmed)?)
    }

    /// Creates one bookmark as the last item of `namespace`.
    pub fn create_bookmark(
        &self,
        namespace: Namespace,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Bookmark, BookmarkServiceError> {
        let url = normalize_url(url.into())?;
        let title = normalize_title(title.into())?;
        if let Some(collection_id) = namespace.collection_id() {
            self.repo
                .get_collection(collection_id)?
                .ok_or(BookmarkServiceError::CollectionNotFound(collection_id))?;
        }

        let bookmark = self.repo.atomically(&namespace, |repo| {
            let entries = repo.list_order_keys(&namespace)?;
            let allocation = append_position(&entries, &self.config);
            for entry in &allocation.rebalanced {
                repo.set_position(entry.id, &namespace, entry.order_key)?;
            }
            repo.insert_bookmark(&NewBookmark::new(
                namespace,
                url,
                title,
                allocation.order_key,
            ))
        })?;

        info!(
            "event=bookmark_create module=bookmark status=ok namespace={namespace} sort_order={}",
            bookmark.sort_order
        );
        Ok(bookmark)
    }

    /// Loads one bookmark.
    pub fn get_bookmark(&self, id: BookmarkId) -> Result<Bookmark, BookmarkServiceError> {
        self.repo
            .get_bookmark(id)?
            .ok_or(BookmarkServiceError::BookmarkNotFound(id))
    }

    /// Lists bookmarks of one namespace in display order.
    pub fn list_bookmarks(
        &self,
        namespace: Namespace,
    ) -> Result<Vec<Bookmark>, BookmarkServiceError> {
        if let Some(collection_id) = namespace.collection_id() {
            self.repo
                .get_collection(collection_id)?
                .ok_or(BookmarkServiceError::CollectionNotFound(collection_id))?;
        }
        Ok(self.repo.list_bookmarks(&namespace)?)
    }

    /// Deletes one bookmark. Its namespace keeps a harmless key hole.
    pub fn delete_bookmark(&self, id: BookmarkId) -> Result<(), BookmarkServiceError> {
        self.repo.delete_bookmark(id)?;
        Ok(())
    }
}

fn normalize_title(value: String) -> Result<String, BookmarkServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookmarkServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

fn normalize_url(value: String) -> Result<String, BookmarkServiceError> {
    let trimmed = value.trim();
    if !URL_RE.is_match(trimmed) {
        return Err(BookmarkServiceError::InvalidUrl(value));
    }
    Ok(trimmed.to_string())
}
