//! Generation provider abstraction.
//!
//! This module provides the `GenerationProvider` trait (Adapter Pattern)
//! that the clip worker and the compile step call into, plus the in-tree
//! mock adapter.

pub mod adapters;
pub mod base;

pub use adapters::MockProvider;
pub use base::{GenerationError, GenerationProvider};
