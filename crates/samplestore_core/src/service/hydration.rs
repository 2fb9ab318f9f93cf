//! Cross-store hydration of loaded samples.
//!
//! # Responsibility
//! - Merge a primary record with profile, library, QC, note, change-log and
//!   child data from the collaborator stores.
//!
//! # Invariants
//! - Every collaborator collection is replaced, never appended to, so
//!   hydrating the same sample repeatedly yields the same value.
//! - Children are loaded unhydrated to keep hydration one level deep.

use crate::model::sample::Sample;
use crate::repo::sample_repo::{RepoResult, SampleFilter, SampleListQuery};
use crate::repo::SampleStores;
use rusqlite::Connection;

/// Entity type under which sample changes are logged.
pub const SAMPLE_ENTITY_TYPE: &str = "Sample";

#[derive(Clone)]
pub struct HydrationCoordinator {
    stores: SampleStores,
}

impl HydrationCoordinator {
    pub fn new(stores: SampleStores) -> Self {
        Self { stores }
    }

    /// Populates all collaborator-backed fields of `sample`.
    pub fn hydrate(&self, conn: &Connection, sample: &mut Sample) -> RepoResult<()> {
        let id = sample.id;

        sample.security_profile = match sample.security_profile_id {
            Some(profile_id) => self.stores.profiles.get_profile(conn, profile_id)?,
            None => None,
        };
        sample.libraries = self.stores.libraries.list_by_sample_id(conn, id)?;
        sample.qcs = self.stores.qcs.list_by_sample_id(conn, id)?;
        sample.notes = self.stores.notes.list_by_sample_id(conn, id)?;
        sample.change_log = self
            .stores
            .change_log
            .list_by_entity(conn, SAMPLE_ENTITY_TYPE, id)?;

        if let Some(info) = sample.additional_info.as_mut() {
            info.children = self
                .stores
                .samples
                .list_samples(conn, &SampleListQuery::filtered(SampleFilter::ParentId(id)))?;
        }
        Ok(())
    }

    /// Hydrates every sample in `samples`.
    pub fn hydrate_all(&self, conn: &Connection, samples: &mut [Sample]) -> RepoResult<()> {
        for sample in samples.iter_mut() {
            self.hydrate(conn, sample)?;
        }
        Ok(())
    }
}
