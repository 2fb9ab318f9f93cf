//! Sample aggregate model.
//!
//! # Responsibility
//! - Define the aggregate root persisted across primary and secondary stores.
//! - Keep collaborator-owned collections next to the primary fields so one
//!   value carries the hydrated view.
//!
//! # Invariants
//! - `id <= UNSAVED_ID` means the sample has never been durably created.
//! - `parent_id` is a weak reference; the parent is never owned or embedded.
//! - `libraries`, `qcs`, `notes`, `change_log` are never written by the
//!   primary store.

use super::records::{ChangeLogEntry, Library, Note, ProfileId, SampleQc, SecurityProfile};
use serde::{Deserialize, Serialize};

/// Database-generated sample identifier.
pub type SampleId = i64;

/// Sentinel id of a sample that has not been inserted yet.
pub const UNSAVED_ID: SampleId = 0;

/// Hierarchy data present only for samples taking part in the sample tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAdditionalInfo {
    /// Partition key together with the parent id for sibling numbering.
    pub sample_class_id: i64,
    /// 1-based position among same-class children of one parent.
    pub sibling_number: Option<i64>,
    /// Direct children, materialized on hydrated reads only.
    #[serde(default)]
    pub children: Vec<Sample>,
}

impl SampleAdditionalInfo {
    pub fn new(sample_class_id: i64) -> Self {
        Self {
            sample_class_id,
            sibling_number: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    /// Temporary placeholder until creation assigns the generated name.
    pub name: String,
    pub alias: String,
    pub description: Option<String>,
    pub scientific_name: Option<String>,
    pub sample_type: Option<String>,
    pub identification_barcode: Option<String>,
    /// Owning project; its cached aggregate is invalidated on writes.
    pub project_id: Option<i64>,
    /// Unix epoch milliseconds.
    pub received_date: Option<i64>,
    pub box_position_id: Option<i64>,
    pub experiment_id: Option<i64>,
    pub submission_id: Option<i64>,
    pub parent_id: Option<SampleId>,
    pub additional_info: Option<SampleAdditionalInfo>,
    /// Durable link to the access-control profile.
    pub security_profile_id: Option<ProfileId>,
    /// Cached resolution of `security_profile_id`.
    pub security_profile: Option<SecurityProfile>,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub qcs: Vec<SampleQc>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub change_log: Vec<ChangeLogEntry>,
}

impl Sample {
    /// Creates an unsaved sample with the given alias (may be empty when the
    /// naming scheme generates aliases).
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            name: String::new(),
            alias: alias.into(),
            description: None,
            scientific_name: None,
            sample_type: None,
            identification_barcode: None,
            project_id: None,
            received_date: None,
            box_position_id: None,
            experiment_id: None,
            submission_id: None,
            parent_id: None,
            additional_info: None,
            security_profile_id: None,
            security_profile: None,
            libraries: Vec::new(),
            qcs: Vec::new(),
            notes: Vec::new(),
            change_log: Vec::new(),
        }
    }

    /// Creates an unsaved hierarchy sample under `parent_id`.
    pub fn child_of(parent_id: SampleId, sample_class_id: i64, alias: impl Into<String>) -> Self {
        let mut sample = Self::new(alias);
        sample.parent_id = Some(parent_id);
        sample.additional_info = Some(SampleAdditionalInfo::new(sample_class_id));
        sample
    }

    pub fn is_saved(&self) -> bool {
        self.id > UNSAVED_ID
    }

    /// Sibling number assigned at creation, if this is a numbered child.
    pub fn sibling_number(&self) -> Option<i64> {
        self.additional_info
            .as_ref()
            .and_then(|info| info.sibling_number)
    }
}

#[cfg(test)]
mod tests {
    use super::{Sample, UNSAVED_ID};

    #[test]
    fn new_sample_is_unsaved_and_empty() {
        let sample = Sample::new("alias-1");
        assert_eq!(sample.id, UNSAVED_ID);
        assert!(!sample.is_saved());
        assert!(sample.additional_info.is_none());
        assert!(sample.libraries.is_empty());
    }

    #[test]
    fn child_sample_carries_partition_key() {
        let sample = Sample::child_of(5, 3, "child");
        assert_eq!(sample.parent_id, Some(5));
        let info = sample.additional_info.as_ref().unwrap();
        assert_eq!(info.sample_class_id, 3);
        assert_eq!(sample.sibling_number(), None);
    }
}
