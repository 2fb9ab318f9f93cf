//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate primary and collaborator store calls into sample use-cases.
//! - Keep naming, tree repair and cache invalidation out of the stores.

pub mod creation;
pub mod hydration;
pub mod sample_service;
pub mod secondary;
pub mod sibling;
pub mod tree_repair;
