//! Collaborator-owned records attached to a sample.
//!
//! These are owned by the secondary store and keyed by the sample id; the
//! sample aggregate only carries a hydrated copy.

use serde::{Deserialize, Serialize};

pub type ProfileId = i64;
pub type LibraryId = i64;
pub type QcId = i64;
pub type NoteId = i64;
pub type ChangeId = i64;

/// Access-control profile stored separately from the sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityProfile {
    /// `None` until the profile store persists it.
    pub profile_id: Option<ProfileId>,
    pub owner: Option<String>,
    pub allow_all_internal: bool,
}

impl SecurityProfile {
    /// Unsaved profile owned by `owner`.
    pub fn owned_by(owner: impl Into<String>) -> Self {
        Self {
            profile_id: None,
            owner: Some(owner.into()),
            allow_all_internal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub id: Option<LibraryId>,
    pub sample_id: i64,
    pub name: String,
    pub alias: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleQc {
    pub id: Option<QcId>,
    pub sample_id: i64,
    pub qc_type: String,
    pub results: f64,
    /// Unix epoch milliseconds.
    pub qc_date: i64,
    pub creator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// `None` until saved through the note store.
    pub id: Option<NoteId>,
    pub text: String,
    pub internal_only: bool,
    /// Unix epoch milliseconds.
    pub creation_date: i64,
    pub owner: Option<String>,
}

impl Note {
    pub fn new(text: impl Into<String>, creation_date: i64) -> Self {
        Self {
            id: None,
            text: text.into(),
            internal_only: false,
            creation_date,
            owner: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: Option<ChangeId>,
    /// Entity kind the change refers to, e.g. `Sample`.
    pub entity_type: String,
    pub entity_id: i64,
    pub summary: String,
    pub user_name: Option<String>,
    /// Unix epoch milliseconds.
    pub time: i64,
}
