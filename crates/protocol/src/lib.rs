//! # cf-protocol
//!
//! Core protocol definitions and data models for clipforge.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (TOML config, YAML project definitions)
//! - Project and clip records and their state machines
//! - Script template inputs and outputs
//! - Progress events published to observers
//!
//! ## Modules
//!
//! - [`config_models`]: Global configuration and project definitions
//! - [`project_models`]: Projects, clips, statuses and snapshots
//! - [`script_models`]: Script styles, products and prompt clips
//! - [`ipc`]: Progress events
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid, chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other clipforge crates

pub mod config_models;
pub mod ipc;
pub mod project_models;
pub mod script_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use project_models::*;
pub use script_models::*;
