//! Project and clip state models.
//!
//! A [`Project`] is one video made of ordered [`Clip`]s. Both carry a status
//! enum whose legal transitions are encoded here so every writer agrees on
//! the state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::script_models::{PromptClip, ScriptStyle};

/// Opaque reference to a piece of generated media (image, clip or final cut).
///
/// The provider decides the format (URL, storage key, ...); the pipeline only
/// passes it along.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, TS)]
#[serde(transparent)]
#[ts(type = "string")]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a project.
///
/// Normal progression: Draft -> Generating -> Compiling -> Completed
///
/// Error is reachable from Generating and Compiling; so is Cancelled.
/// Completed, Error and Cancelled are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created by the caller, editable, not yet started.
    Draft,

    /// Clips are being generated one after another.
    Generating,

    /// All clips resolved; the final video is being assembled.
    Compiling,

    /// The final video exists.
    Completed,

    /// Unrecoverable failure. Clip-level detail is preserved.
    Error,

    /// Stopped by the caller before finishing.
    Cancelled,
}

impl ProjectStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Completed | ProjectStatus::Error | ProjectStatus::Cancelled
        )
    }

    /// True while a pipeline run owns the project.
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Generating | ProjectStatus::Compiling)
    }

    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Draft, Generating)
                | (Generating, Compiling)
                | (Generating, Error)
                | (Generating, Cancelled)
                | (Compiling, Completed)
                | (Compiling, Error)
                | (Compiling, Cancelled)
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Generating => "generating",
            ProjectStatus::Compiling => "compiling",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Error => "error",
            ProjectStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of a single clip.
///
/// Pending -> ImageGenerating -> VideoGenerating -> Done, with Failed
/// reachable from every non-terminal state and Cancelled reachable from
/// every non-terminal state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    Pending,
    ImageGenerating,
    VideoGenerating,
    Done,
    Failed,
    Cancelled,
}

impl ClipStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClipStatus::Done | ClipStatus::Failed | ClipStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: ClipStatus) -> bool {
        use ClipStatus::*;
        match (self, next) {
            (Pending, ImageGenerating) | (ImageGenerating, VideoGenerating) => true,
            (VideoGenerating, Done) => true,
            (from, Failed | Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClipStatus::Pending => "pending",
            ClipStatus::ImageGenerating => "image_generating",
            ClipStatus::VideoGenerating => "video_generating",
            ClipStatus::Done => "done",
            ClipStatus::Failed => "failed",
            ClipStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The two provider-backed stages a clip goes through.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStage {
    Image,
    Video,
}

impl GenerationStage {
    /// The clip status shown while this stage runs.
    pub fn clip_status(&self) -> ClipStatus {
        match self {
            GenerationStage::Image => ClipStatus::ImageGenerating,
            GenerationStage::Video => ClipStatus::VideoGenerating,
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStage::Image => f.write_str("image"),
            GenerationStage::Video => f.write_str("video"),
        }
    }
}

/// Why a clip ended up `failed`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transient provider errors persisted through every attempt.
    RetriesExhausted,

    /// The provider refused the request (e.g. prompt content); not retried.
    Rejected,

    /// Both prompts were empty, so the clip was never sent.
    EmptyPrompt,

    /// The service stopped while the clip was in flight.
    Interrupted,
}

/// Failure detail attached to a clip.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ClipFailure {
    pub kind: FailureKind,

    /// Stage that failed, if the clip got that far.
    pub stage: Option<GenerationStage>,

    /// Provider or pipeline message, surfaced to the caller as-is.
    pub message: String,
}

/// One segment of a project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct Clip {
    /// 0-based timeline position, contiguous within the project.
    pub index: usize,

    pub image_prompt: String,

    pub video_prompt: String,

    /// Optional spoken line; never required for generation.
    #[serde(default)]
    pub voice_line: Option<String>,

    pub status: ClipStatus,

    /// Number of retry attempts across both stages. Only ever increases.
    pub retry_count: u32,

    #[serde(default)]
    pub image_ref: Option<MediaRef>,

    #[serde(default)]
    pub video_ref: Option<MediaRef>,

    #[serde(default)]
    pub failure: Option<ClipFailure>,
}

impl Clip {
    /// A clip is eligible for generation when at least one prompt has content.
    pub fn is_eligible(&self) -> bool {
        !self.image_prompt.trim().is_empty() || !self.video_prompt.trim().is_empty()
    }
}

/// The persisted record of one video project.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Project {
    #[ts(type = "string")]
    pub id: Uuid,

    pub name: String,

    pub status: ProjectStatus,

    /// Timeline-ordered clips.
    pub clips: Vec<Clip>,

    /// Style the clips were seeded from, if any.
    #[serde(default)]
    pub style: Option<ScriptStyle>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Always `clips.len()`.
    pub clip_count: usize,

    /// Always the number of clips in `Done`.
    pub completed_clips: usize,

    /// Incremented by the store on every committed write.
    pub revision: u64,

    #[serde(default)]
    pub final_video: Option<MediaRef>,

    /// Project-level error message when `status` is `Error`.
    #[serde(default)]
    pub error: Option<String>,
}

impl Project {
    /// Recompute the cached counters from `clips`.
    pub fn recount(&mut self) {
        self.clip_count = self.clips.len();
        self.completed_clips = self
            .clips
            .iter()
            .filter(|clip| clip.status == ClipStatus::Done)
            .count();
    }

    pub fn has_eligible_clip(&self) -> bool {
        self.clips.iter().any(Clip::is_eligible)
    }

    pub fn all_clips_terminal(&self) -> bool {
        self.clips.iter().all(|clip| clip.status.is_terminal())
    }

    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    pub fn clip_mut(&mut self, index: usize) -> Option<&mut Clip> {
        self.clips.get_mut(index)
    }

    /// Point-in-time view for progress observers.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            project_id: self.id,
            name: self.name.clone(),
            status: self.status,
            revision: self.revision,
            clip_count: self.clip_count,
            completed_clips: self.completed_clips,
            clips: self.clips.iter().map(ClipSnapshot::from).collect(),
            final_video: self.final_video.clone(),
            error: self.error.clone(),
        }
    }
}

/// Caller-supplied prompts for one clip.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct ClipSpec {
    #[serde(default)]
    pub image_prompt: String,

    #[serde(default)]
    pub video_prompt: String,

    #[serde(default)]
    pub voice_line: Option<String>,
}

impl From<PromptClip> for ClipSpec {
    fn from(clip: PromptClip) -> Self {
        Self {
            image_prompt: clip.image_prompt,
            video_prompt: clip.video_prompt,
            voice_line: Some(clip.voice_line),
        }
    }
}

/// Input of the "create project" operation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct NewProject {
    pub name: String,

    /// Clip prompts in timeline order.
    pub clips: Vec<ClipSpec>,

    #[serde(default)]
    pub style: Option<ScriptStyle>,
}

/// Per-clip portion of a [`ProjectSnapshot`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ClipSnapshot {
    pub index: usize,
    pub status: ClipStatus,
    pub retry_count: u32,
    pub failure: Option<ClipFailure>,
}

impl From<&Clip> for ClipSnapshot {
    fn from(clip: &Clip) -> Self {
        Self {
            index: clip.index,
            status: clip.status,
            retry_count: clip.retry_count,
            failure: clip.failure.clone(),
        }
    }
}

/// What a progress observer sees: project status plus per-clip status.
///
/// Two snapshots of the same `revision` are identical.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ProjectSnapshot {
    #[ts(type = "string")]
    pub project_id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub revision: u64,
    pub clip_count: usize,
    pub completed_clips: usize,
    pub clips: Vec<ClipSnapshot>,
    pub final_video: Option<MediaRef>,
    pub error: Option<String>,
}
