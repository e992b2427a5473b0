//! # sk-protocol
//!
//! Core data model for step-kit.
//!
//! This crate defines all shared data structures used for:
//! - Process and process step records as they live in a process store
//! - Step type identifiers and their retrigger counterparts
//! - Step status transitions driven by the execution engine
//!
//! ## Modules
//!
//! - [`process_models`]: Process records and process type identifiers
//! - [`step_models`]: Process step records, step types, and step statuses
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde, uuid, and chrono
//! - Wire stability: All identifiers serialize as SCREAMING_SNAKE_CASE strings
//! - Independent compilation: No dependencies on other step-kit crates

pub mod process_models;
pub mod step_models;

// Re-export all public types for convenience
pub use process_models::*;
pub use step_models::*;
