//! Repository layer: primary and collaborator stores.
//!
//! # Responsibility
//! - Define one store contract per storage concern.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every store call takes the transactional connection explicitly; stores
//!   keep no connection or session state of their own.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod change_log_repo;
pub mod library_repo;
pub mod note_repo;
pub mod profile_repo;
pub mod qc_repo;
pub mod sample_repo;

use change_log_repo::{ChangeLogRepository, SqliteChangeLogRepository};
use library_repo::{LibraryRepository, SqliteLibraryRepository};
use note_repo::{NoteRepository, SqliteNoteRepository};
use profile_repo::{SecurityProfileRepository, SqliteSecurityProfileRepository};
use qc_repo::{SampleQcRepository, SqliteSampleQcRepository};
use sample_repo::{SampleRepository, SqliteSampleRepository};
use std::sync::Arc;

/// Named sub-repositories making up the split sample aggregate.
#[derive(Clone)]
pub struct SampleStores {
    pub samples: Arc<dyn SampleRepository>,
    pub profiles: Arc<dyn SecurityProfileRepository>,
    pub libraries: Arc<dyn LibraryRepository>,
    pub qcs: Arc<dyn SampleQcRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub change_log: Arc<dyn ChangeLogRepository>,
}

impl SampleStores {
    /// All stores backed by the SQLite schema in this crate.
    pub fn sqlite() -> Self {
        Self {
            samples: Arc::new(SqliteSampleRepository),
            profiles: Arc::new(SqliteSecurityProfileRepository),
            libraries: Arc::new(SqliteLibraryRepository),
            qcs: Arc::new(SqliteSampleQcRepository),
            notes: Arc::new(SqliteNoteRepository),
            change_log: Arc::new(SqliteChangeLogRepository),
        }
    }
}

impl Default for SampleStores {
    fn default() -> Self {
        Self::sqlite()
    }
}
