//! Clip generation worker.
//!
//! Runs one clip through its two provider-backed stages, image then video,
//! writing and publishing every transition on the way. Provider errors end
//! up on the clip; only store errors are returned to the caller.

pub mod retry;

use crate::error::PipelineResult;
use crate::generation::{GenerationError, GenerationProvider};
use crate::state::transitions::StateWriter;
use cf_protocol::{Clip, ClipFailure, FailureKind, GenerationStage, MediaRef};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use retry::{retry_with_backoff, RetryOutcome, RetryPolicy};

/// Terminal result of one clip run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    Done,
    Failed,
    /// Stopped at a stage boundary or during backoff. The clip itself is
    /// still non-terminal; the caller marks it cancelled.
    Cancelled,
}

pub struct ClipWorker {
    provider: Arc<dyn GenerationProvider>,
    policy: RetryPolicy,
}

impl ClipWorker {
    pub fn new(provider: Arc<dyn GenerationProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Run `clip` to a terminal state.
    ///
    /// # Arguments
    ///
    /// * `writer` - Writes and publishes transitions of the clip's project
    /// * `clip` - The clip as it was when the run reached it (`pending`)
    /// * `cancel` - Checked before each stage and during backoff
    ///
    /// # Errors
    ///
    /// Returns an error only if a transition cannot be committed.
    pub async fn run(
        &self,
        writer: &StateWriter,
        clip: &Clip,
        cancel: &CancellationToken,
    ) -> PipelineResult<ClipOutcome> {
        let project_id = writer.project_id();
        let index = clip.index;

        if cancel.is_cancelled() {
            return Ok(ClipOutcome::Cancelled);
        }

        if !clip.is_eligible() {
            warn!(project_id = %project_id, clip_index = index, "Clip has no prompt; skipping");
            writer
                .fail_clip(
                    index,
                    ClipFailure {
                        kind: FailureKind::EmptyPrompt,
                        stage: None,
                        message: "both image and video prompts are empty".to_string(),
                    },
                )
                .await?;
            return Ok(ClipOutcome::Failed);
        }

        info!(project_id = %project_id, clip_index = index, "Generating clip");

        let image_prompt = prompt_or(&clip.image_prompt, &clip.video_prompt);
        writer.begin_stage(index, GenerationStage::Image).await?;
        let provider = &self.provider;
        let outcome = retry_with_backoff(
            &self.policy,
            cancel,
            move || provider.generate_image(image_prompt),
            move |_, message| async move {
                writer
                    .record_retry(index, GenerationStage::Image, message)
                    .await
                    .map(|_| ())
            },
        )
        .await?;

        let image = match outcome {
            RetryOutcome::Success(image) => image,
            RetryOutcome::Failed { error, attempts } => {
                return self
                    .fail_stage(writer, index, GenerationStage::Image, error, attempts)
                    .await;
            }
            RetryOutcome::Cancelled => return Ok(ClipOutcome::Cancelled),
        };
        writer.record_image(index, image.clone()).await?;

        if cancel.is_cancelled() {
            return Ok(ClipOutcome::Cancelled);
        }

        let video_prompt = prompt_or(&clip.video_prompt, &clip.image_prompt);
        writer.begin_stage(index, GenerationStage::Video).await?;
        let image_ref: &MediaRef = &image;
        let outcome = retry_with_backoff(
            &self.policy,
            cancel,
            move || provider.generate_video(video_prompt, image_ref),
            move |_, message| async move {
                writer
                    .record_retry(index, GenerationStage::Video, message)
                    .await
                    .map(|_| ())
            },
        )
        .await?;

        match outcome {
            RetryOutcome::Success(video) => {
                let project = writer.finish_clip(index, video).await?;
                let retry_count = project.clip(index).map_or(0, |c| c.retry_count);
                info!(project_id = %project_id, clip_index = index, retry_count, "Clip done");
                Ok(ClipOutcome::Done)
            }
            RetryOutcome::Failed { error, attempts } => {
                self.fail_stage(writer, index, GenerationStage::Video, error, attempts)
                    .await
            }
            RetryOutcome::Cancelled => Ok(ClipOutcome::Cancelled),
        }
    }

    async fn fail_stage(
        &self,
        writer: &StateWriter,
        index: usize,
        stage: GenerationStage,
        error: GenerationError,
        attempts: u32,
    ) -> PipelineResult<ClipOutcome> {
        let kind = if error.is_transient() {
            FailureKind::RetriesExhausted
        } else {
            FailureKind::Rejected
        };
        warn!(
            project_id = %writer.project_id(),
            clip_index = index,
            stage = %stage,
            attempts,
            error = %error,
            "Clip failed"
        );
        writer
            .fail_clip(
                index,
                ClipFailure {
                    kind,
                    stage: Some(stage),
                    message: error.to_string(),
                },
            )
            .await?;
        Ok(ClipOutcome::Failed)
    }
}

/// The preferred prompt, or the other one when it is blank.
fn prompt_or<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.trim().is_empty() {
        fallback
    } else {
        preferred
    }
}
