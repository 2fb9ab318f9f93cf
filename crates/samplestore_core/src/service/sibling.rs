//! Sibling number assignment within a `(parent, sample class)` partition.
//!
//! # Invariants
//! - Result is `max + 1` over existing siblings, or `1` for the first child.
//! - Callers run this inside an IMMEDIATE unit of work so no other writer can
//!   insert into the partition between this read and the insert.

use crate::model::sample::SampleId;
use crate::repo::sample_repo::{RepoResult, SampleRepository};
use rusqlite::Connection;
use std::sync::Arc;

#[derive(Clone)]
pub struct SiblingNumberAssigner {
    samples: Arc<dyn SampleRepository>,
}

impl SiblingNumberAssigner {
    pub fn new(samples: Arc<dyn SampleRepository>) -> Self {
        Self { samples }
    }

    /// Next free sibling number for a child of `parent_id` in `sample_class_id`.
    pub fn next(
        &self,
        conn: &Connection,
        parent_id: SampleId,
        sample_class_id: i64,
    ) -> RepoResult<i64> {
        let max = self
            .samples
            .max_sibling_number(conn, parent_id, sample_class_id)?;
        Ok(max.map_or(1, |value| value + 1))
    }
}
