//! Domain model for samples and their collaborator records.
//!
//! # Responsibility
//! - Define the sample aggregate shared by creation, update and hydration.
//! - Define the records owned by collaborator stores.
//!
//! # Invariants
//! - Every durable sample is identified by a database-generated `SampleId`.
//! - Collaborator records reference samples by id only.

pub mod records;
pub mod sample;
