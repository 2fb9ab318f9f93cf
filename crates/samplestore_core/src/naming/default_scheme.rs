//! Default id-based sample naming scheme.
//!
//! Names are `<prefix><id>` with optional zero padding. Aliases are free-form
//! but restricted to a safe character set; generation is opt-in.

use super::{is_temporary, NamingError, NamingField, SampleNamingScheme};
use crate::model::sample::Sample;
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_NAME_PREFIX: &str = "SAM";

static ALIAS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid alias regex"));

/// Configurable id-based naming scheme.
#[derive(Debug, Clone)]
pub struct DefaultSampleNamingScheme {
    name_prefix: String,
    name_width: usize,
    alias_prefix: Option<String>,
    allow_duplicate_alias: bool,
}

impl Default for DefaultSampleNamingScheme {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            name_width: 0,
            alias_prefix: None,
            allow_duplicate_alias: false,
        }
    }
}

impl DefaultSampleNamingScheme {
    /// `SAM<id>` names, no alias generation, duplicate aliases forbidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `<prefix><id>` names with the id zero-padded to `width` digits.
    pub fn with_name_format(mut self, prefix: impl Into<String>, width: usize) -> Self {
        self.name_prefix = prefix.into();
        self.name_width = width;
        self
    }

    /// Enables alias generation for samples created without one: numbered
    /// children get `<prefix><parent id>_<class id>_<sibling number>`, others
    /// `<prefix><id>`.
    pub fn with_alias_generator(mut self, prefix: impl Into<String>) -> Self {
        self.alias_prefix = Some(prefix.into());
        self
    }

    pub fn allowing_duplicate_aliases(mut self, allow: bool) -> Self {
        self.allow_duplicate_alias = allow;
        self
    }

    fn generate_name(&self, sample: &Sample) -> Result<String, NamingError> {
        if !sample.is_saved() {
            return Err(NamingError::MissingId(NamingField::Name));
        }
        Ok(format!(
            "{}{:0width$}",
            self.name_prefix,
            sample.id,
            width = self.name_width
        ))
    }

    fn generate_alias(&self, sample: &Sample) -> Result<String, NamingError> {
        let prefix = self
            .alias_prefix
            .as_deref()
            .ok_or(NamingError::NoGenerator(NamingField::Alias))?;
        if !sample.is_saved() {
            return Err(NamingError::MissingId(NamingField::Alias));
        }
        // Sibling numbers are unique only within (parent, class), so both
        // partition keys are part of the alias.
        match (sample.parent_id, sample.additional_info.as_ref()) {
            (Some(parent_id), Some(info)) => match info.sibling_number {
                Some(sibling_number) => Ok(format!(
                    "{prefix}{parent_id}_{}_{sibling_number}",
                    info.sample_class_id
                )),
                None => Ok(format!("{prefix}{}", sample.id)),
            },
            _ => Ok(format!("{prefix}{}", sample.id)),
        }
    }

    fn is_valid_name(&self, value: &str) -> bool {
        value
            .strip_prefix(self.name_prefix.as_str())
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }
}

impl SampleNamingScheme for DefaultSampleNamingScheme {
    fn has_generator(&self, field: NamingField) -> bool {
        match field {
            NamingField::Name => true,
            NamingField::Alias => self.alias_prefix.is_some(),
        }
    }

    fn generate(&self, field: NamingField, sample: &Sample) -> Result<String, NamingError> {
        match field {
            NamingField::Name => self.generate_name(sample),
            NamingField::Alias => self.generate_alias(sample),
        }
    }

    fn validate(&self, field: NamingField, value: &str) -> bool {
        if is_temporary(value) {
            return false;
        }
        match field {
            NamingField::Name => self.is_valid_name(value),
            NamingField::Alias => ALIAS_RE.is_match(value),
        }
    }

    fn allows_duplicate(&self, field: NamingField) -> bool {
        match field {
            NamingField::Name => false,
            NamingField::Alias => self.allow_duplicate_alias,
        }
    }
}
