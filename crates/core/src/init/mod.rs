//! Initialization module for creating `.clipforge` directory structures.
//!
//! This module initializes a new clipforge workspace by generating a
//! `.clipforge/` directory with pre-configured templates for:
//! - Global configuration (`config.toml`)
//! - Project definitions (`projects/*.yaml`)
//!
//! # Example
//!
//! ```no_run
//! use cf_core::init::{InitOptions, generate_clipforge_structure};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! generate_clipforge_structure(options).await?;
//! println!("clipforge initialized successfully!");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_clipforge_structure, InitOptions};
pub use templates::{get_template, list_templates};
