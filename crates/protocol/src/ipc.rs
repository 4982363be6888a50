//! Progress events.
//!
//! The pipeline publishes an [`Event`] for every state transition of a
//! project or one of its clips. Each event carries the full
//! [`ProjectSnapshot`] taken right after the transition was committed, so an
//! observer never has to merge partial updates.
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "clipStatusUpdate",
//!   "payload": {
//!     "project_id": "uuid-here",
//!     "clip_index": 0,
//!     "status": "image_generating",
//!     "retry_count": 0,
//!     "snapshot": { "...": "..." }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::project_models::{ClipStatus, GenerationStage, ProjectSnapshot, ProjectStatus};

/// Events sent from the pipeline to progress observers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The project moved to a new status.
    ProjectStatusUpdate {
        #[ts(type = "string")]
        project_id: Uuid,
        status: ProjectStatus,
        snapshot: ProjectSnapshot,
    },

    /// A clip moved to a new status.
    ClipStatusUpdate {
        #[ts(type = "string")]
        project_id: Uuid,
        clip_index: usize,
        status: ClipStatus,
        retry_count: u32,
        snapshot: ProjectSnapshot,
    },

    /// A transient provider error is about to be retried.
    ClipRetry {
        #[ts(type = "string")]
        project_id: Uuid,
        clip_index: usize,
        stage: GenerationStage,
        retry_count: u32,
        error: String,
        snapshot: ProjectSnapshot,
    },
}

impl Event {
    pub fn project_id(&self) -> Uuid {
        match self {
            Event::ProjectStatusUpdate { project_id, .. }
            | Event::ClipStatusUpdate { project_id, .. }
            | Event::ClipRetry { project_id, .. } => *project_id,
        }
    }

    /// The project state right after this transition.
    pub fn snapshot(&self) -> &ProjectSnapshot {
        match self {
            Event::ProjectStatusUpdate { snapshot, .. }
            | Event::ClipStatusUpdate { snapshot, .. }
            | Event::ClipRetry { snapshot, .. } => snapshot,
        }
    }

    pub fn into_snapshot(self) -> ProjectSnapshot {
        match self {
            Event::ProjectStatusUpdate { snapshot, .. }
            | Event::ClipStatusUpdate { snapshot, .. }
            | Event::ClipRetry { snapshot, .. } => snapshot,
        }
    }
}
