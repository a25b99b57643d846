//! Activity records emitted by board use-cases.
//!
//! # Responsibility
//! - Describe what a batch action did (`action`, target, ids).
//! - Provide log-only and SQLite-backed recorders.
//!
//! # Invariants
//! - Recording is a side channel: callers never fail a move because an
//!   activity record could not be written.

use crate::model::bookmark::BookmarkId;
use crate::model::namespace::Namespace;
use crate::repo::store::{StoreError, StoreResult};
use log::info;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of recorded activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    BulkMove,
}

impl ActivityAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::BulkMove => "bulk_move",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "bulk_move" => Some(Self::BulkMove),
            _ => None,
        }
    }
}

impl Display for ActivityAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one batch action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub action: ActivityAction,
    pub target: Namespace,
    pub item_ids: Vec<BookmarkId>,
}

impl ActivityRecord {
    pub fn bulk_move(target: Namespace, item_ids: Vec<BookmarkId>) -> Self {
        Self {
            action: ActivityAction::BulkMove,
            target,
            item_ids,
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_ids.len()
    }
}

/// Sink for activity records.
pub trait ActivityRecorder {
    fn record(&self, record: &ActivityRecord) -> StoreResult<()>;
}

/// Recorder that only writes a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogActivityRecorder;

impl ActivityRecorder for LogActivityRecorder {
    fn record(&self, record: &ActivityRecord) -> StoreResult<()> {
        info!(
            "event=activity module=activity status=ok action={} target={} count={}",
            record.action,
            record.target,
            record.item_count()
        );
        Ok(())
    }
}

/// Recorder persisting into the `activity_log` table.
pub struct SqliteActivityRecorder<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActivityRecorder<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the newest records first.
    pub fn recent(&self, limit: u32) -> StoreResult<Vec<ActivityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT action, target_collection_uuid, item_ids
             FROM activity_log
             ORDER BY id DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let action_text: String = row.get(0)?;
            let action = ActivityAction::parse(&action_text).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "invalid action `{action_text}` in activity_log.action"
                ))
            })?;
            let target = row
                .get::<_, Option<String>>(1)?
                .map(|value| {
                    uuid::Uuid::parse_str(&value).map_err(|_| {
                        StoreError::InvalidData(format!(
                            "invalid uuid `{value}` in activity_log.target_collection_uuid"
                        ))
                    })
                })
                .transpose()?;
            let ids_text: String = row.get(2)?;
            let item_ids = serde_json::from_str(&ids_text).map_err(|err| {
                StoreError::InvalidData(format!("invalid activity_log.item_ids: {err}"))
            })?;
            records.push(ActivityRecord {
                action,
                target: Namespace::from_collection(target),
                item_ids,
            });
        }
        Ok(records)
    }
}

impl ActivityRecorder for SqliteActivityRecorder<'_> {
    fn record(&self, record: &ActivityRecord) -> StoreResult<()> {
        let item_ids = serde_json::to_string(&record.item_ids)
            .map_err(|err| StoreError::InvalidData(format!("unencodable item ids: {err}")))?;
        let item_count = i64::try_from(record.item_count())
            .map_err(|_| StoreError::InvalidData("activity item count overflow".to_string()))?;
        self.conn.execute(
            "INSERT INTO activity_log (
                action,
                target_collection_uuid,
                item_count,
                item_ids
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                record.action.as_str(),
                record.target.collection_id().map(|id| id.to_string()),
                item_count,
                item_ids,
            ],
        )?;
        Ok(())
    }
}
