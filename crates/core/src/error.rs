//! Error types returned by pipeline operations.
//!
//! Input errors are returned synchronously and never change state. Provider
//! failures during a run are not surfaced here; they are recorded on the
//! clip or project they belong to.

use cf_protocol::{ProjectStatus, UnrecognizedStyleError};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::config::error::ConfigError;

/// Errors returned by the pipeline manager and the project store.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    UnrecognizedStyle(#[from] UnrecognizedStyleError),

    /// Every clip of the project has two empty prompts.
    #[error("Project {0} has no clip with a non-empty prompt")]
    NoEligibleClips(Uuid),

    /// The operation is not allowed in the project's current status.
    #[error("Project {project_id} is {status}: cannot {operation}")]
    InvalidState {
        project_id: Uuid,
        status: ProjectStatus,
        operation: &'static str,
    },

    /// A write would break the project or clip state machine.
    #[error("Illegal transition in project {project_id}: {detail}")]
    IllegalTransition { project_id: Uuid, detail: String },

    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The generation provider reported itself unavailable.
    #[error("Generation provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Reading or writing a persisted project record failed.
    #[error("Storage error at {path}: {reason}")]
    Storage { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub(crate) fn invalid_state(
        project_id: Uuid,
        status: ProjectStatus,
        operation: &'static str,
    ) -> Self {
        PipelineError::InvalidState {
            project_id,
            status,
            operation,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Type alias for Result with PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;
