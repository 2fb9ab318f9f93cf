//! Sample note store.
//!
//! # Responsibility
//! - Persist notes and their link to a sample (`notes` + `sample_notes`).
//!
//! # Invariants
//! - Saving a note that already has an id updates it in place; it never
//!   creates a second link row.
//! - Note listing is deterministic: `creation_date ASC, note_id ASC`.

use super::sample_repo::{RepoError, RepoResult};
use crate::model::records::{Note, NoteId};
use crate::model::sample::SampleId;
use rusqlite::{params, Connection};

pub trait NoteRepository: Send + Sync {
    fn list_by_sample_id(&self, conn: &Connection, sample_id: SampleId) -> RepoResult<Vec<Note>>;
    /// Inserts or updates `note` and links it to `sample_id`; returns the note id.
    fn save_sample_note(
        &self,
        conn: &Connection,
        sample_id: SampleId,
        note: &Note,
    ) -> RepoResult<NoteId>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteNoteRepository;

impl NoteRepository for SqliteNoteRepository {
    fn list_by_sample_id(&self, conn: &Connection, sample_id: SampleId) -> RepoResult<Vec<Note>> {
        let mut stmt = conn.prepare(
            "SELECT n.note_id, n.text, n.internal_only, n.creation_date, n.owner
             FROM notes n
             INNER JOIN sample_notes sn ON sn.note_id = n.note_id
             WHERE sn.sample_id = ?1
             ORDER BY n.creation_date ASC, n.note_id ASC;",
        )?;
        let mut rows = stmt.query([sample_id])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(Note {
                id: Some(row.get(0)?),
                text: row.get(1)?,
                internal_only: row.get::<_, i64>(2)? != 0,
                creation_date: row.get(3)?,
                owner: row.get(4)?,
            });
        }
        Ok(notes)
    }

    fn save_sample_note(
        &self,
        conn: &Connection,
        sample_id: SampleId,
        note: &Note,
    ) -> RepoResult<NoteId> {
        let note_id = match note.id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE notes
                     SET text = ?2, internal_only = ?3, owner = ?4
                     WHERE note_id = ?1;",
                    params![id, note.text.as_str(), note.internal_only, note.owner.as_deref()],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound { entity: "note", id });
                }
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO notes (text, internal_only, creation_date, owner)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        note.text.as_str(),
                        note.internal_only,
                        note.creation_date,
                        note.owner.as_deref(),
                    ],
                )?;
                conn.last_insert_rowid()
            }
        };

        conn.execute(
            "INSERT OR IGNORE INTO sample_notes (sample_id, note_id) VALUES (?1, ?2);",
            params![sample_id, note_id],
        )?;
        Ok(note_id)
    }
}
