//! Sample use-case service.
//!
//! # Responsibility
//! - Provide the create/update/save/delete entry points over one
//!   [`UnitOfWork`] and the hydrated read API over a connection.
//! - Translate store failures into [`SampleServiceError`].
//!
//! # Invariants
//! - Write operations refuse to run inside an aborted unit of work.
//! - A failed write marks its unit of work aborted and restores the caller's
//!   sample to its pre-call value.
//! - Every read except `get_lazy` returns fully hydrated samples.

use super::creation::{ensure_alias_available, CreationProtocol};
use super::hydration::HydrationCoordinator;
use super::secondary::SecondaryWriter;
use crate::cache::{CacheInvalidator, CacheManager};
use crate::config::SampleStoreConfig;
use crate::db::{DbError, UnitOfWork};
use crate::model::sample::{Sample, SampleId};
use crate::naming::{NamingError, SampleNamingScheme};
use crate::repo::sample_repo::{
    RepoError, SampleFilter, SampleListQuery, SampleLookup, SampleOrder,
};
use crate::repo::SampleStores;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Service error for sample use-cases.
#[derive(Debug)]
pub enum SampleServiceError {
    /// Name/alias generation or validation failed, including alias conflicts.
    Naming(NamingError),
    /// Store I/O failure.
    Storage(RepoError),
    /// Persisting the sample's unsaved security profile failed.
    ProfileCreation(RepoError),
    /// `create` was called on a sample that already has an id.
    AlreadySaved(SampleId),
    /// `update`/`delete` was called on a sample without an id.
    NotSaved,
    /// Target sample (or referenced parent) does not exist.
    NotFound(SampleId),
    /// An earlier step in the same unit of work failed.
    UnitAborted,
}

impl SampleServiceError {
    /// Whether this is a post-insert alias conflict.
    pub fn is_duplicate_alias(&self) -> bool {
        matches!(self, Self::Naming(NamingError::DuplicateAlias(_)))
    }
}

impl Display for SampleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Naming(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::ProfileCreation(err) => write!(f, "security profile creation failed: {err}"),
            Self::AlreadySaved(id) => write!(f, "sample already saved: {id}"),
            Self::NotSaved => write!(f, "sample has not been saved"),
            Self::NotFound(id) => write!(f, "sample not found: {id}"),
            Self::UnitAborted => write!(f, "unit of work was aborted by an earlier failure"),
        }
    }
}

impl Error for SampleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Naming(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::ProfileCreation(err) => Some(err),
            Self::AlreadySaved(_) => None,
            Self::NotSaved => None,
            Self::NotFound(_) => None,
            Self::UnitAborted => None,
        }
    }
}

impl From<NamingError> for SampleServiceError {
    fn from(value: NamingError) -> Self {
        Self::Naming(value)
    }
}

impl From<RepoError> for SampleServiceError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<DbError> for SampleServiceError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::UnitOfWorkAborted => Self::UnitAborted,
            other => Self::Storage(RepoError::Db(other)),
        }
    }
}

pub type ServiceResult<T> = Result<T, SampleServiceError>;

/// Result of deleting a sample's primary record.
///
/// Collaborator rows are not cascaded; their counts are reported here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub sample_id: SampleId,
    pub orphaned_libraries: usize,
    pub orphaned_qcs: usize,
    pub orphaned_notes: usize,
    pub orphaned_change_log: usize,
}

impl DeleteOutcome {
    pub fn has_orphans(&self) -> bool {
        self.orphaned_libraries > 0
            || self.orphaned_qcs > 0
            || self.orphaned_notes > 0
            || self.orphaned_change_log > 0
    }
}

/// Use-case service for the split sample aggregate.
#[derive(Clone)]
pub struct SampleService {
    stores: SampleStores,
    naming: Arc<dyn SampleNamingScheme>,
    creation: CreationProtocol,
    hydration: HydrationCoordinator,
    secondary: SecondaryWriter,
}

impl SampleService {
    pub fn new(
        stores: SampleStores,
        naming: Arc<dyn SampleNamingScheme>,
        caches: Option<Arc<CacheManager>>,
        config: &SampleStoreConfig,
    ) -> Self {
        let invalidator = CacheInvalidator::new(caches, config.project_cache_name.clone());
        let secondary = SecondaryWriter::new(stores.notes.clone(), invalidator);
        let creation = CreationProtocol::new(
            stores.clone(),
            naming.clone(),
            secondary.clone(),
            config.auto_generate_identification_barcodes,
        );
        let hydration = HydrationCoordinator::new(stores.clone());
        Self {
            stores,
            naming,
            creation,
            hydration,
            secondary,
        }
    }

    /// Creates a new sample; see [`CreationProtocol::create`].
    pub fn create(&self, uow: &mut UnitOfWork<'_>, sample: &mut Sample) -> ServiceResult<SampleId> {
        self.creation.create(uow, sample)
    }

    /// Writes an existing sample back to the primary and secondary stores.
    ///
    /// # Contract
    /// - A resolved profile's id is copied onto the sample; an unsaved profile
    ///   is persisted first.
    /// - The duplicate-alias policy is re-checked after the write.
    pub fn update(&self, uow: &mut UnitOfWork<'_>, sample: &mut Sample) -> ServiceResult<()> {
        if uow.is_aborted() {
            return Err(SampleServiceError::UnitAborted);
        }
        if !sample.is_saved() {
            return Err(SampleServiceError::NotSaved);
        }

        let started_at = Instant::now();
        let snapshot = sample.clone();
        match self.run_update(uow.conn(), sample) {
            Ok(()) => {
                info!(
                    "event=sample_update module=service status=ok sample_id={} duration_ms={}",
                    sample.id,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=sample_update module=service status=error sample_id={} error={}",
                    snapshot.id, err
                );
                uow.mark_aborted();
                *sample = snapshot;
                Err(err)
            }
        }
    }

    /// Creates unsaved samples and updates saved ones. Returns the sample id.
    pub fn save(&self, uow: &mut UnitOfWork<'_>, sample: &mut Sample) -> ServiceResult<SampleId> {
        if sample.is_saved() {
            self.update(uow, sample)?;
            return Ok(sample.id);
        }
        self.create(uow, sample)
    }

    /// Runs [`Self::save`] in its own unit of work and commits it.
    pub fn save_committed(
        &self,
        conn: &mut Connection,
        sample: &mut Sample,
    ) -> ServiceResult<SampleId> {
        let snapshot = sample.clone();
        let mut uow = UnitOfWork::begin(conn)?;
        let id = self.save(&mut uow, sample)?;
        if let Err(err) = uow.commit() {
            *sample = snapshot;
            return Err(err.into());
        }
        Ok(id)
    }

    /// Deletes the sample's primary record.
    ///
    /// Library, QC, note and change-log rows are left in place and counted in
    /// the returned [`DeleteOutcome`]. Deleting a sample that still has
    /// children fails with a storage error.
    pub fn delete(&self, uow: &mut UnitOfWork<'_>, sample: &Sample) -> ServiceResult<DeleteOutcome> {
        if uow.is_aborted() {
            return Err(SampleServiceError::UnitAborted);
        }
        if !sample.is_saved() {
            return Err(SampleServiceError::NotSaved);
        }

        match self.run_delete(uow.conn(), sample) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(
                    "event=sample_delete module=service status=error sample_id={} error={}",
                    sample.id, err
                );
                uow.mark_aborted();
                Err(err)
            }
        }
    }

    /// Hydrated sample by id.
    pub fn get(&self, conn: &Connection, id: SampleId) -> ServiceResult<Option<Sample>> {
        let sample = self.stores.samples.get_sample(conn, id)?;
        self.hydrate_one(conn, sample)
    }

    /// Primary record only; collaborator collections stay empty.
    pub fn get_lazy(&self, conn: &Connection, id: SampleId) -> ServiceResult<Option<Sample>> {
        Ok(self.stores.samples.get_sample(conn, id)?)
    }

    pub fn get_by_barcode(&self, conn: &Connection, barcode: &str) -> ServiceResult<Option<Sample>> {
        let sample = self
            .stores
            .samples
            .find_sample(conn, SampleLookup::Barcode(barcode))?;
        self.hydrate_one(conn, sample)
    }

    pub fn get_by_box_position(
        &self,
        conn: &Connection,
        position_id: i64,
    ) -> ServiceResult<Option<Sample>> {
        let sample = self
            .stores
            .samples
            .find_sample(conn, SampleLookup::BoxPosition(position_id))?;
        self.hydrate_one(conn, sample)
    }

    pub fn get_by_barcodes(&self, conn: &Connection, barcodes: &[String]) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery::filtered(SampleFilter::Barcodes(barcodes.to_vec())),
        )
    }

    pub fn get_by_ids(&self, conn: &Connection, ids: &[SampleId]) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(conn, SampleListQuery::filtered(SampleFilter::Ids(ids.to_vec())))
    }

    pub fn list_all(&self, conn: &Connection) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(conn, SampleListQuery::default())
    }

    pub fn list_all_with_limit(&self, conn: &Connection, limit: u32) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery {
                limit: Some(limit),
                ..SampleListQuery::default()
            },
        )
    }

    /// Most recently received first.
    pub fn list_all_by_received_date(
        &self,
        conn: &Connection,
        limit: u32,
    ) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery {
                filter: SampleFilter::All,
                order: SampleOrder::ReceivedDateDesc,
                limit: Some(limit),
            },
        )
    }

    pub fn list_by_alias(&self, conn: &Connection, alias: &str) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery::filtered(SampleFilter::Alias(alias.to_string())),
        )
    }

    pub fn list_by_project_id(&self, conn: &Connection, project_id: i64) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(conn, SampleListQuery::filtered(SampleFilter::ProjectId(project_id)))
    }

    pub fn list_by_experiment_id(
        &self,
        conn: &Connection,
        experiment_id: i64,
    ) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery::filtered(SampleFilter::ExperimentId(experiment_id)),
        )
    }

    pub fn list_by_submission_id(
        &self,
        conn: &Connection,
        submission_id: i64,
    ) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery::filtered(SampleFilter::SubmissionId(submission_id)),
        )
    }

    /// `LIKE` search over barcode, name, alias, description and scientific
    /// name. `pattern` carries its own wildcards, e.g. `liver%`.
    pub fn list_by_search(&self, conn: &Connection, pattern: &str) -> ServiceResult<Vec<Sample>> {
        self.list_hydrated(
            conn,
            SampleListQuery::filtered(SampleFilter::Search(pattern.to_string())),
        )
    }

    pub fn list_sample_types(&self, conn: &Connection) -> ServiceResult<Vec<String>> {
        Ok(self.stores.samples.list_sample_types(conn)?)
    }

    pub fn count(&self, conn: &Connection) -> ServiceResult<u64> {
        Ok(self.stores.samples.count_samples(conn)?)
    }

    fn run_update(&self, conn: &Connection, sample: &mut Sample) -> ServiceResult<()> {
        if let Some(profile) = sample.security_profile.as_mut() {
            let profile_id = match profile.profile_id {
                Some(profile_id) => profile_id,
                None => {
                    let profile_id = self
                        .stores
                        .profiles
                        .save_profile(conn, profile)
                        .map_err(SampleServiceError::ProfileCreation)?;
                    profile.profile_id = Some(profile_id);
                    profile_id
                }
            };
            sample.security_profile_id = Some(profile_id);
        }

        self.stores
            .samples
            .update_sample(conn, sample)
            .map_err(|err| match err {
                RepoError::NotFound { id, .. } => SampleServiceError::NotFound(id),
                other => other.into(),
            })?;

        ensure_alias_available(
            conn,
            self.stores.samples.as_ref(),
            self.naming.as_ref(),
            &sample.alias,
        )?;

        self.secondary.persist(conn, sample)?;
        Ok(())
    }

    fn run_delete(&self, conn: &Connection, sample: &Sample) -> ServiceResult<DeleteOutcome> {
        let id = sample.id;
        let outcome = DeleteOutcome {
            sample_id: id,
            orphaned_libraries: self.stores.libraries.list_by_sample_id(conn, id)?.len(),
            orphaned_qcs: self.stores.qcs.list_by_sample_id(conn, id)?.len(),
            orphaned_notes: self.stores.notes.list_by_sample_id(conn, id)?.len(),
            orphaned_change_log: self
                .stores
                .change_log
                .list_by_entity(conn, super::hydration::SAMPLE_ENTITY_TYPE, id)?
                .len(),
        };

        self.stores
            .samples
            .delete_sample(conn, id)
            .map_err(|err| match err {
                RepoError::NotFound { id, .. } => SampleServiceError::NotFound(id),
                other => other.into(),
            })?;

        if outcome.has_orphans() {
            warn!(
                "event=sample_delete module=service status=orphans sample_id={} libraries={} qcs={} notes={} change_log={}",
                id,
                outcome.orphaned_libraries,
                outcome.orphaned_qcs,
                outcome.orphaned_notes,
                outcome.orphaned_change_log
            );
        } else {
            info!(
                "event=sample_delete module=service status=ok sample_id={}",
                id
            );
        }

        self.secondary.invalidate_owner(sample);
        Ok(outcome)
    }

    fn hydrate_one(
        &self,
        conn: &Connection,
        sample: Option<Sample>,
    ) -> ServiceResult<Option<Sample>> {
        match sample {
            Some(mut sample) => {
                self.hydration.hydrate(conn, &mut sample)?;
                Ok(Some(sample))
            }
            None => Ok(None),
        }
    }

    fn list_hydrated(&self, conn: &Connection, query: SampleListQuery) -> ServiceResult<Vec<Sample>> {
        let mut samples = self.stores.samples.list_samples(conn, &query)?;
        self.hydration.hydrate_all(conn, &mut samples)?;
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteOutcome, SampleServiceError};
    use crate::db::DbError;
    use crate::naming::NamingError;
    use crate::repo::sample_repo::RepoError;
    use std::error::Error;

    #[test]
    fn aborted_commit_maps_to_unit_aborted() {
        let err: SampleServiceError = DbError::UnitOfWorkAborted.into();
        assert!(matches!(err, SampleServiceError::UnitAborted));
    }

    #[test]
    fn duplicate_alias_is_recognized_and_chained() {
        let err: SampleServiceError = NamingError::DuplicateAlias("A1".to_string()).into();
        assert!(err.is_duplicate_alias());
        assert!(err.source().is_some());

        let storage: SampleServiceError = RepoError::InvalidData("x".to_string()).into();
        assert!(!storage.is_duplicate_alias());
    }

    #[test]
    fn outcome_without_collaborator_rows_has_no_orphans() {
        let mut outcome = DeleteOutcome {
            sample_id: 1,
            orphaned_libraries: 0,
            orphaned_qcs: 0,
            orphaned_notes: 0,
            orphaned_change_log: 0,
        };
        assert!(!outcome.has_orphans());
        outcome.orphaned_notes = 2;
        assert!(outcome.has_orphans());
    }
}
