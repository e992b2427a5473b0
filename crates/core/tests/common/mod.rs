//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality across all integration
//! tests including:
//! - Test fixtures (seeded repositories, step inspection helpers)
//! - A scriptable mock executor

pub mod fixtures;
pub mod mock_executor;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_executor::*;
