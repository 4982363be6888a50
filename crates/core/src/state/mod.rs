//! Project state management.
//!
//! This module provides:
//! - Project records and the stores that hold them
//! - Transition writes that commit and publish in one step
//! - PipelineManager for coordinating projects and their runs

pub mod manager;
pub mod store;
pub mod transitions;

pub use manager::PipelineManager;
