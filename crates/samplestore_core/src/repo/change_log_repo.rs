//! Change history store keyed by entity type and id.

use super::sample_repo::RepoResult;
use crate::model::records::{ChangeId, ChangeLogEntry};
use rusqlite::{params, Connection};

pub trait ChangeLogRepository: Send + Sync {
    /// Entries for one entity, oldest first.
    fn list_by_entity(
        &self,
        conn: &Connection,
        entity_type: &str,
        entity_id: i64,
    ) -> RepoResult<Vec<ChangeLogEntry>>;
    fn record_change(&self, conn: &Connection, entry: &ChangeLogEntry) -> RepoResult<ChangeId>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteChangeLogRepository;

impl ChangeLogRepository for SqliteChangeLogRepository {
    fn list_by_entity(
        &self,
        conn: &Connection,
        entity_type: &str,
        entity_id: i64,
    ) -> RepoResult<Vec<ChangeLogEntry>> {
        let mut stmt = conn.prepare(
            "SELECT change_id, entity_type, entity_id, summary, user_name, change_time
             FROM change_log
             WHERE entity_type = ?1
               AND entity_id = ?2
             ORDER BY change_time ASC, change_id ASC;",
        )?;
        let mut rows = stmt.query(params![entity_type, entity_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(ChangeLogEntry {
                id: Some(row.get("change_id")?),
                entity_type: row.get("entity_type")?,
                entity_id: row.get("entity_id")?,
                summary: row.get("summary")?,
                user_name: row.get("user_name")?,
                time: row.get("change_time")?,
            });
        }
        Ok(entries)
    }

    fn record_change(&self, conn: &Connection, entry: &ChangeLogEntry) -> RepoResult<ChangeId> {
        conn.execute(
            "INSERT INTO change_log (entity_type, entity_id, summary, user_name, change_time)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.entity_type.as_str(),
                entry.entity_id,
                entry.summary.as_str(),
                entry.user_name.as_deref(),
                entry.time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
