//! Tree repair triggered by a child's name finalization.
//!
//! A parent may have been stored while still carrying a placeholder name.
//! Once one of its children is being named, the parent's id is known to be
//! final, so its permanent name is generated and persisted in the same unit
//! of work.

use super::sample_service::SampleServiceError;
use crate::model::sample::Sample;
use crate::naming::{is_temporary, NamingError, NamingField, SampleNamingScheme};
use crate::repo::sample_repo::SampleRepository;
use log::info;
use rusqlite::Connection;
use std::sync::Arc;

#[derive(Clone)]
pub struct TreeRepair {
    samples: Arc<dyn SampleRepository>,
    naming: Arc<dyn SampleNamingScheme>,
}

impl TreeRepair {
    pub fn new(samples: Arc<dyn SampleRepository>, naming: Arc<dyn SampleNamingScheme>) -> Self {
        Self { samples, naming }
    }

    /// Gives `child`'s parent a permanent name if it still holds a placeholder.
    ///
    /// Returns the new parent name, or `None` when nothing needed repair.
    ///
    /// # Errors
    /// - `NotFound` when the referenced parent row does not exist.
    /// - `Naming` when the generated parent name fails validation.
    pub fn finalize_parent_name(
        &self,
        conn: &Connection,
        child: &Sample,
    ) -> Result<Option<String>, SampleServiceError> {
        if child.additional_info.is_none() {
            return Ok(None);
        }
        let Some(parent_id) = child.parent_id else {
            return Ok(None);
        };

        let mut parent = self
            .samples
            .get_sample(conn, parent_id)?
            .ok_or(SampleServiceError::NotFound(parent_id))?;
        if !parent.is_saved() || !is_temporary(&parent.name) {
            return Ok(None);
        }

        let name = self.naming.generate(NamingField::Name, &parent)?;
        if !self.naming.validate(NamingField::Name, &name) {
            return Err(NamingError::InvalidValue {
                field: NamingField::Name,
                value: name,
            }
            .into());
        }
        parent.name = name.clone();
        self.samples.update_sample(conn, &parent)?;

        info!(
            "event=tree_repair module=service status=ok parent_id={} child_id={}",
            parent_id, child.id
        );
        Ok(Some(name))
    }
}
