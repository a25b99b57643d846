//! SQLite-backed board repository.
//!
//! # Responsibility
//! - Implement `OrderingStore` and `BookmarkRepository` over one connection.
//! - Translate `Namespace` to the nullable `collection_uuid` column.
//!
//! # Invariants
//! - `atomically` opens a `BEGIN IMMEDIATE` transaction, so a move's
//!   read-compute-write sequence never interleaves with another writer.
//! - Namespace listing order: `sort_order ASC, created_at DESC, uuid ASC`.

use crate::db::migrations::latest_version;
use crate::model::bookmark::{Bookmark, BookmarkId, Collection, CollectionId, NewBookmark};
use crate::model::namespace::{Namespace, OrderEntry};
use crate::repo::store::{BookmarkRepository, OrderingStore, StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const BOOKMARK_SELECT_SQL: &str = "SELECT
    uuid,
    url,
    title,
    collection_uuid,
    sort_order,
    created_at,
    updated_at
FROM bookmarks";

const BOOKMARK_COLUMNS: &[&str] = &[
    "uuid",
    "url",
    "title",
    "collection_uuid",
    "sort_order",
    "created_at",
    "updated_at",
];

/// SQLite-backed bookmark board repository.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_board_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl OrderingStore for SqliteBoardRepository<'_> {
    fn list_order_keys(&self, namespace: &Namespace) -> StoreResult<Vec<OrderEntry>> {
        let mut entries = Vec::new();
        match namespace.collection_id() {
            Some(collection_id) => {
                let mut stmt = self.conn.prepare(
                    "SELECT uuid, sort_order
                     FROM bookmarks
                     WHERE collection_uuid = ?1
                     ORDER BY sort_order ASC, created_at DESC, uuid ASC;",
                )?;
                let mut rows = stmt.query([collection_id.to_string()])?;
                while let Some(row) = rows.next()? {
                    entries.push(parse_order_entry_row(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT uuid, sort_order
                     FROM bookmarks
                     WHERE collection_uuid IS NULL
                     ORDER BY sort_order ASC, created_at DESC, uuid ASC;",
                )?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    entries.push(parse_order_entry_row(row)?);
                }
            }
        }
        Ok(entries)
    }

    fn set_position(
        &self,
        item_id: BookmarkId,
        namespace: &Namespace,
        order_key: i64,
    ) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE bookmarks
             SET collection_uuid = ?2,
                 sort_order = ?3,
                 updated_at = CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)
             WHERE uuid = ?1;",
            params![
                item_id.to_string(),
                namespace.collection_id().map(|id| id.to_string()),
                order_key,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::ItemNotFound(item_id));
        }
        Ok(())
    }

    fn atomically<T, F>(&self, namespace: &Namespace, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match work(self) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(
                    "event=store_tx module=repo status=rollback namespace={namespace} error={err}"
                );
                // Uncommitted transactions roll back on drop.
                drop(tx);
                Err(err)
            }
        }
    }
}

impl BookmarkRepository for SqliteBoardRepository<'_> {
    fn create_collection(&self, name: &str) -> StoreResult<Collection> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO collections (uuid, name) VALUES (?1, ?2);",
            params![id.to_string(), name],
        )?;
        self.get_collection(id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("collection {id} missing after insert"))
        })
    }

    fn get_collection(&self, id: CollectionId) -> StoreResult<Option<Collection>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, name, created_at
                 FROM collections
                 WHERE uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(uuid_text, name, created_at)| -> StoreResult<Collection> {
            Ok(Collection {
                id: parse_uuid(&uuid_text, "collections.uuid")?,
                name,
                created_at,
            })
        })
        .transpose()
    }

    fn insert_bookmark(&self, bookmark: &NewBookmark) -> StoreResult<Bookmark> {
        self.conn.execute(
            "INSERT INTO bookmarks (
                uuid,
                url,
                title,
                collection_uuid,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                bookmark.id.to_string(),
                bookmark.url.as_str(),
                bookmark.title.as_str(),
                bookmark.namespace.collection_id().map(|id| id.to_string()),
                bookmark.sort_order,
            ],
        )?;
        self.get_bookmark(bookmark.id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("bookmark {} missing after insert", bookmark.id))
        })
    }

    fn get_bookmark(&self, id: BookmarkId) -> StoreResult<Option<Bookmark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOKMARK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bookmark_row(row)?));
        }
        Ok(None)
    }

    fn list_bookmarks(&self, namespace: &Namespace) -> StoreResult<Vec<Bookmark>> {
        let order_by = "ORDER BY sort_order ASC, created_at DESC, uuid ASC";
        let mut bookmarks = Vec::new();
        match namespace.collection_id() {
            Some(collection_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{BOOKMARK_SELECT_SQL} WHERE collection_uuid = ?1 {order_by};"
                ))?;
                let mut rows = stmt.query([collection_id.to_string()])?;
                while let Some(row) = rows.next()? {
                    bookmarks.push(parse_bookmark_row(row)?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "{BOOKMARK_SELECT_SQL} WHERE collection_uuid IS NULL {order_by};"
                ))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    bookmarks.push(parse_bookmark_row(row)?);
                }
            }
        }
        Ok(bookmarks)
    }

    fn delete_bookmark(&self, id: BookmarkId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM bookmarks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::ItemNotFound(id));
        }
        Ok(())
    }
}

fn parse_order_entry_row(row: &Row<'_>) -> StoreResult<OrderEntry> {
    let uuid_text: String = row.get(0)?;
    Ok(OrderEntry::new(
        parse_uuid(&uuid_text, "bookmarks.uuid")?,
        row.get(1)?,
    ))
}

fn parse_bookmark_row(row: &Row<'_>) -> StoreResult<Bookmark> {
    let uuid_text: String = row.get("uuid")?;
    let collection_id = row
        .get::<_, Option<String>>("collection_uuid")?
        .map(|value| parse_uuid(&value, "bookmarks.collection_uuid"))
        .transpose()?;

    Ok(Bookmark {
        id: parse_uuid(&uuid_text, "bookmarks.uuid")?,
        url: row.get("url")?,
        title: row.get("title")?,
        namespace: Namespace::from_collection(collection_id),
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_board_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["collections", "bookmarks", "activity_log"] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }
    for &column in BOOKMARK_COLUMNS {
        if !table_has_column(conn, "bookmarks", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "bookmarks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
