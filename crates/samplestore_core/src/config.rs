//! Runtime configuration for the sample store.
//!
//! # Responsibility
//! - Hold the knobs that change persistence behavior (barcode generation,
//!   cache lookup name, lock wait).
//! - Parse configuration documents with every field optional.

use serde::{Deserialize, Serialize};

const DEFAULT_PROJECT_CACHE_NAME: &str = "projectCache";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Sample store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleStoreConfig {
    /// When set, creation derives `identification_barcode` as `name::alias`.
    pub auto_generate_identification_barcodes: bool,
    /// Cache looked up to drop a project aggregate after sample writes.
    pub project_cache_name: String,
    /// How long a unit of work waits for the database write lock.
    pub busy_timeout_ms: u64,
}

impl Default for SampleStoreConfig {
    fn default() -> Self {
        Self {
            auto_generate_identification_barcodes: false,
            project_cache_name: DEFAULT_PROJECT_CACHE_NAME.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl SampleStoreConfig {
    /// Parses a JSON document; missing fields fall back to defaults.
    pub fn from_json_str(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::SampleStoreConfig;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SampleStoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SampleStoreConfig::default());
        assert_eq!(config.project_cache_name, "projectCache");
        assert!(!config.auto_generate_identification_barcodes);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config = SampleStoreConfig::from_json_str(
            r#"{"auto_generate_identification_barcodes": true, "busy_timeout_ms": 250}"#,
        )
        .unwrap();
        assert!(config.auto_generate_identification_barcodes);
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.project_cache_name, "projectCache");
    }

    #[test]
    fn malformed_document_is_rejected() {
        assert!(SampleStoreConfig::from_json_str("{\"busy_timeout_ms\": \"soon\"}").is_err());
    }
}
