//! Worker configuration loading and management.
//!
//! This module provides functionality to load and validate the optional
//! TOML settings file a hosting worker points the engine at.

pub mod error;
pub mod loader;
pub mod models;
