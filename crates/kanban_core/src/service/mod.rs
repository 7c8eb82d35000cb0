//! Board use-case services.
//!
//! # Responsibility
//! - Validate user input before it reaches a repository.
//! - Orchestrate repository calls into use-case level APIs.
//!
//! # Invariants
//! - Services stay storage-agnostic; they only see repository traits.
//! - Validation failures never issue a write.

pub mod auth_service;
pub mod contact_service;
pub mod task_service;
pub mod validation;
