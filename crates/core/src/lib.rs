//! # sk-core
//!
//! Core step execution engine and executor management for step-kit.
//!
//! This crate provides:
//! - The executor abstraction every process type plugs into
//! - The per-process execution engine driving steps to a final status
//! - A polling service that walks all active processes of registered types
//! - A persistence seam with an in-memory, snapshot-backed implementation
//!
//! ## Modules
//!
//! - [`config`]: Worker configuration loading and management
//! - [`executors`]: Executor trait, registry, and built-in executors
//! - [`engine`]: Per-process step execution engine
//! - [`persistence`]: Process store abstraction and in-memory store
//! - [`service`]: Polling loop over all active processes

pub mod config;
pub mod engine;
pub mod executors;
pub mod persistence;
pub mod service;
