//! Errors raised while scaffolding `.clipforge/`.

use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// Refused to overwrite an existing workspace without `--force`.
    #[error(".clipforge directory already exists at {0:?}. Use --force to overwrite.")]
    DirectoryExists(PathBuf),

    /// The binary was built without this embedded template.
    #[error("Embedded template missing: {0}")]
    TemplateNotFound(String),

    #[error("Failed to create directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write template to {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
