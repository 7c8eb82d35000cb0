//! Demo-data seeding.
//!
//! # Responsibility
//! - Hold the fixed demo contacts, tasks and users.
//! - Upload them once, or reset both collections to them on demand.
//!
//! # Invariants
//! - A seed against a populated store performs no writes.
//! - Contacts and tasks are always written together in one multi-path update.

pub mod demo_data;
mod seeder;

pub use seeder::{DemoDataStatus, DemoSeeder, SeedError, SeedOutcome, SeedResult};
