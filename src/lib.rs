//! Support Config Library
//!
//! Configuration persistence and change propagation for the support app:
//! a key-value store adapter, a namespaced caching storage service, the
//! configuration document manager, and a reactive binding for UI state.

pub mod binding;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod settings;
pub mod storage;
pub mod store;
