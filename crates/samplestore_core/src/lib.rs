//! Core persistence for laboratory samples split across a primary store and
//! collaborator stores.
//! This crate is the single source of truth for sample identity invariants.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod naming;
pub mod repo;
pub mod service;

pub use cache::{project_cache_key, Cache, CacheInvalidator, CacheManager, InMemoryCache};
pub use config::SampleStoreConfig;
pub use db::{open_db, open_db_in_memory, open_db_with_config, DbError, DbResult, UnitOfWork};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::records::{ChangeLogEntry, Library, Note, SampleQc, SecurityProfile};
pub use model::sample::{Sample, SampleAdditionalInfo, SampleId, UNSAVED_ID};
pub use naming::{DefaultSampleNamingScheme, NamingError, NamingField, SampleNamingScheme};
pub use repo::sample_repo::{RepoError, RepoResult};
pub use repo::SampleStores;
pub use service::sample_service::{DeleteOutcome, SampleService, SampleServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
