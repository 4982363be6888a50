//! Configuration loading and management.
//!
//! This module loads global settings and project definitions from the
//! `.clipforge/` directory structure.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::AppConfig;
