//! # cf-core
//!
//! Core clip pipeline and script engine for clipforge.
//!
//! This crate provides:
//! - Configuration loading from the `.clipforge/` directory
//! - Script templates that turn a product into clip prompts
//! - The generation provider abstraction and a mock provider
//! - The clip worker, pipeline engine and progress fan-out
//! - Project state management for running pipelines
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`script`]: Style templates and pain-point extraction
//! - [`generation`]: Provider trait and adapter implementations
//! - [`worker`]: Per-clip generation with retry
//! - [`engine`]: Pipeline execution engine
//! - [`progress`]: Progress events and snapshot subscriptions
//! - [`state`]: Project stores and the PipelineManager
//! - [`init`]: `.clipforge/` scaffolding

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod init;
pub mod progress;
pub mod script;
pub mod state;
pub mod worker;

pub use error::{PipelineError, PipelineResult};
pub use state::PipelineManager;
