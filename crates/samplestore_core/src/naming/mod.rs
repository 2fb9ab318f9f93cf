//! Naming policy contract for sample identifier fields.
//!
//! # Responsibility
//! - Define the policy interface used to generate and validate `name` and
//!   `alias` values.
//! - Own the reserved placeholder namespace used before an id exists.
//!
//! # Invariants
//! - Placeholders always start with [`TEMPORARY_NAME_PREFIX`] and are unique.
//! - Id-dependent fields are generated only after the sample id is final.

mod default_scheme;

pub use default_scheme::DefaultSampleNamingScheme;

use crate::model::sample::Sample;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Marker prefix distinguishing placeholders from real names and aliases.
pub const TEMPORARY_NAME_PREFIX: &str = "TEMPORARY_S";

/// Returns a fresh collision-free placeholder.
pub fn temporary_name() -> String {
    format!("{TEMPORARY_NAME_PREFIX}{}", Uuid::new_v4())
}

/// Returns whether `value` is a placeholder rather than a real value.
pub fn is_temporary(value: &str) -> bool {
    value.starts_with(TEMPORARY_NAME_PREFIX)
}

/// Identifier-like sample field governed by the naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingField {
    Name,
    Alias,
}

impl NamingField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Alias => "alias",
        }
    }
}

impl Display for NamingField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Naming failures. All of them abort the enclosing unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// Policy has no generator for the field.
    NoGenerator(NamingField),
    /// Generator needs the final sample id, which is not assigned yet.
    MissingId(NamingField),
    /// Field value was rejected by the policy.
    InvalidValue { field: NamingField, value: String },
    /// Policy forbids duplicate aliases and another live sample already uses it.
    DuplicateAlias(String),
}

impl Display for NamingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoGenerator(field) => write!(f, "naming scheme cannot generate `{field}`"),
            Self::MissingId(field) => {
                write!(f, "cannot generate `{field}` before the sample id is assigned")
            }
            Self::InvalidValue { field, value } => {
                write!(f, "invalid sample {field}: `{value}`")
            }
            Self::DuplicateAlias(alias) => {
                write!(f, "a sample with alias `{alias}` already exists")
            }
        }
    }
}

impl Error for NamingError {}

/// Policy object generating and validating sample identifier fields.
///
/// Implementations must be deterministic for their declared inputs, or at
/// least produce unique values for fields where duplicates are forbidden.
pub trait SampleNamingScheme: Send + Sync {
    /// Whether [`SampleNamingScheme::generate`] supports `field`.
    fn has_generator(&self, field: NamingField) -> bool;
    /// Generates a permanent value for `field` from current sample state.
    fn generate(&self, field: NamingField, sample: &Sample) -> Result<String, NamingError>;
    /// Checks a candidate value for `field`.
    fn validate(&self, field: NamingField, value: &str) -> bool;
    /// Whether two live samples may share the same value for `field`.
    fn allows_duplicate(&self, field: NamingField) -> bool;
}
