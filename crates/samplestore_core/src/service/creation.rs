//! Two-phase sample creation.
//!
//! # Responsibility
//! - Insert a sample under placeholder identity, then replace the
//!   placeholders with generated values once the database id exists.
//! - Enforce the alias policy after the insert and roll everything back on
//!   any failure.
//!
//! # Invariants
//! - States advance `New -> TemporaryIdentity -> Inserted -> Named ->
//!   Finalized`; any failure moves to `Aborted`, marks the unit of work
//!   aborted and restores the caller's sample to its pre-call value.
//! - A finalized sample never keeps a placeholder name.
//! - Barcode is derived only after name and alias both validate.

use super::sample_service::SampleServiceError;
use super::secondary::SecondaryWriter;
use super::sibling::SiblingNumberAssigner;
use super::tree_repair::TreeRepair;
use crate::db::UnitOfWork;
use crate::model::sample::{Sample, SampleId};
use crate::naming::{is_temporary, temporary_name, NamingError, NamingField, SampleNamingScheme};
use crate::repo::sample_repo::SampleRepository;
use crate::repo::SampleStores;
use log::{debug, info, warn};
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Instant;

/// Creation protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    New,
    TemporaryIdentity,
    Inserted,
    Named,
    Finalized,
    Aborted,
}

impl CreationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::TemporaryIdentity => "temporary_identity",
            Self::Inserted => "inserted",
            Self::Named => "named",
            Self::Finalized => "finalized",
            Self::Aborted => "aborted",
        }
    }
}

/// Returns `name::alias`, the auto-generated identification barcode.
pub fn identification_barcode_for(sample: &Sample) -> String {
    format!("{}::{}", sample.name, sample.alias)
}

/// Rejects `alias` when the policy forbids duplicates and more than one live
/// row (the caller's own row included) carries it.
pub(crate) fn ensure_alias_available(
    conn: &Connection,
    samples: &dyn SampleRepository,
    naming: &dyn SampleNamingScheme,
    alias: &str,
) -> Result<(), SampleServiceError> {
    if naming.allows_duplicate(NamingField::Alias) {
        return Ok(());
    }
    if samples.count_by_alias(conn, alias)? > 1 {
        return Err(NamingError::DuplicateAlias(alias.to_string()).into());
    }
    Ok(())
}

#[derive(Clone)]
pub struct CreationProtocol {
    stores: SampleStores,
    naming: Arc<dyn SampleNamingScheme>,
    siblings: SiblingNumberAssigner,
    tree_repair: TreeRepair,
    secondary: SecondaryWriter,
    auto_generate_barcodes: bool,
}

impl CreationProtocol {
    pub fn new(
        stores: SampleStores,
        naming: Arc<dyn SampleNamingScheme>,
        secondary: SecondaryWriter,
        auto_generate_barcodes: bool,
    ) -> Self {
        let siblings = SiblingNumberAssigner::new(stores.samples.clone());
        let tree_repair = TreeRepair::new(stores.samples.clone(), naming.clone());
        Self {
            stores,
            naming,
            siblings,
            tree_repair,
            secondary,
            auto_generate_barcodes,
        }
    }

    /// Creates `sample` inside `uow` and returns its database id.
    ///
    /// On success `sample` holds its final id, name, alias, barcode, sibling
    /// number and note ids. On failure `sample` is left exactly as passed in
    /// and `uow` can only roll back.
    pub fn create(
        &self,
        uow: &mut UnitOfWork<'_>,
        sample: &mut Sample,
    ) -> Result<SampleId, SampleServiceError> {
        if uow.is_aborted() {
            return Err(SampleServiceError::UnitAborted);
        }
        if sample.is_saved() {
            return Err(SampleServiceError::AlreadySaved(sample.id));
        }

        let started_at = Instant::now();
        let snapshot = sample.clone();
        let mut state = CreationState::New;

        match self.run(uow.conn(), sample, &mut state) {
            Ok(id) => {
                info!(
                    "event=sample_create module=service status=ok sample_id={} duration_ms={}",
                    id,
                    started_at.elapsed().as_millis()
                );
                Ok(id)
            }
            Err(err) => {
                warn!(
                    "event=sample_create module=service status=error failed_state={} next_state={} duration_ms={} error={}",
                    state.as_str(),
                    CreationState::Aborted.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                uow.mark_aborted();
                *sample = snapshot;
                Err(err)
            }
        }
    }

    fn run(
        &self,
        conn: &Connection,
        sample: &mut Sample,
        state: &mut CreationState,
    ) -> Result<SampleId, SampleServiceError> {
        // Placeholders satisfy NOT NULL/UNIQUE until the id exists.
        sample.name = temporary_name();
        if sample.alias.trim().is_empty() && self.naming.has_generator(NamingField::Alias) {
            sample.alias = temporary_name();
        }
        advance(state, CreationState::TemporaryIdentity);

        if let (Some(parent_id), Some(info)) = (sample.parent_id, sample.additional_info.as_mut())
        {
            info.sibling_number = Some(self.siblings.next(conn, parent_id, info.sample_class_id)?);
        }

        if let Some(profile_id) = sample
            .security_profile
            .as_ref()
            .and_then(|profile| profile.profile_id)
        {
            sample.security_profile_id = Some(profile_id);
        }
        let id = self.stores.samples.insert_sample(conn, sample)?;
        advance(state, CreationState::Inserted);

        if let Some(profile) = sample.security_profile.as_mut() {
            if profile.profile_id.is_none() {
                let profile_id = self
                    .stores
                    .profiles
                    .save_profile(conn, profile)
                    .map_err(SampleServiceError::ProfileCreation)?;
                profile.profile_id = Some(profile_id);
                sample.security_profile_id = Some(profile_id);
            }
        }

        sample.id = id;

        self.tree_repair.finalize_parent_name(conn, sample)?;

        if is_temporary(&sample.alias) && self.naming.has_generator(NamingField::Alias) {
            sample.alias = self.naming.generate(NamingField::Alias, sample)?;
        }
        sample.name = self.naming.generate(NamingField::Name, sample)?;
        advance(state, CreationState::Named);

        self.validate_identity(sample)?;
        if self.auto_generate_barcodes {
            sample.identification_barcode = Some(identification_barcode_for(sample));
        }

        self.stores.samples.update_sample(conn, sample)?;

        ensure_alias_available(
            conn,
            self.stores.samples.as_ref(),
            self.naming.as_ref(),
            &sample.alias,
        )?;

        self.secondary.persist(conn, sample)?;
        advance(state, CreationState::Finalized);
        Ok(id)
    }

    fn validate_identity(&self, sample: &Sample) -> Result<(), NamingError> {
        for (field, value) in [
            (NamingField::Name, sample.name.as_str()),
            (NamingField::Alias, sample.alias.as_str()),
        ] {
            if !self.naming.validate(field, value) {
                return Err(NamingError::InvalidValue {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn advance(state: &mut CreationState, next: CreationState) {
    debug!(
        "event=sample_create_state module=service from={} to={}",
        state.as_str(),
        next.as_str()
    );
    *state = next;
}
