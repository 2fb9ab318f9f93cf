//! Writes shared by creation and update once the primary row is final:
//! secondary-store-only fields, then cache invalidation.

use crate::cache::CacheInvalidator;
use crate::model::sample::Sample;
use crate::repo::note_repo::NoteRepository;
use crate::repo::sample_repo::RepoResult;
use log::debug;
use rusqlite::Connection;
use std::sync::Arc;

#[derive(Clone)]
pub struct SecondaryWriter {
    notes: Arc<dyn NoteRepository>,
    invalidator: CacheInvalidator,
}

impl SecondaryWriter {
    pub fn new(notes: Arc<dyn NoteRepository>, invalidator: CacheInvalidator) -> Self {
        Self { notes, invalidator }
    }

    /// Persists the sample's notes (recording assigned note ids) and drops
    /// the owning project's cached aggregate.
    pub fn persist(&self, conn: &Connection, sample: &mut Sample) -> RepoResult<()> {
        let sample_id = sample.id;
        for note in sample.notes.iter_mut() {
            let note_id = self.notes.save_sample_note(conn, sample_id, note)?;
            note.id = Some(note_id);
        }
        debug!(
            "event=secondary_persist module=service status=ok sample_id={} notes={}",
            sample_id,
            sample.notes.len()
        );

        self.invalidate_owner(sample);
        Ok(())
    }

    /// Drops the owning project's cached aggregate, if any.
    pub fn invalidate_owner(&self, sample: &Sample) {
        if let Some(project_id) = sample.project_id {
            self.invalidator.invalidate_project(project_id);
        }
    }
}
