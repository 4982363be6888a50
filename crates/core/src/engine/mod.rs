//! Pipeline execution engine.
//!
//! The PipelineEngine drives one project run: it hands clips to the
//! [`ClipWorker`] strictly in index order, then compiles the finished clips
//! into the final video and moves the project to its terminal status.

use crate::error::{PipelineError, PipelineResult};
use crate::generation::GenerationProvider;
use crate::progress::ProgressPublisher;
use crate::state::store::ProjectStore;
use crate::state::transitions::StateWriter;
use crate::worker::{retry_with_backoff, ClipOutcome, ClipWorker, RetryOutcome, RetryPolicy};
use cf_protocol::{ClipStatus, MediaRef, Project, ProjectStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The main pipeline execution engine.
///
/// The engine holds only shared handles, so one instance serves every
/// concurrently running project.
pub struct PipelineEngine {
    provider: Arc<dyn GenerationProvider>,
    store: Arc<dyn ProjectStore>,
    publisher: Arc<ProgressPublisher>,
    policy: RetryPolicy,
    worker: ClipWorker,
}

impl PipelineEngine {
    /// Create a new PipelineEngine.
    ///
    /// # Arguments
    ///
    /// * `provider` - Generation capability used for every stage and the compile step
    /// * `store` - Project records
    /// * `publisher` - Receives an event for every committed transition
    /// * `policy` - Retry policy for stages and compilation
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Arc<dyn ProjectStore>,
        publisher: Arc<ProgressPublisher>,
        policy: RetryPolicy,
    ) -> Self {
        let worker = ClipWorker::new(Arc::clone(&provider), policy);
        Self {
            provider,
            store,
            publisher,
            policy,
            worker,
        }
    }

    /// Run a project that is already `generating` to a terminal status.
    ///
    /// This is the main entry point for pipeline execution. It:
    /// 1. Runs every clip through the worker, in index order
    /// 2. Moves straight to `error` if no clip finished
    /// 3. Otherwise moves to `compiling` and compiles the finished clips
    /// 4. Ends in `completed`, `error`, or `cancelled`
    ///
    /// # Returns
    ///
    /// The final project record.
    ///
    /// # Errors
    ///
    /// Returns an error if a transition cannot be committed. The project is
    /// then moved to `error` on a best-effort basis.
    pub async fn run(&self, project_id: Uuid, cancel: CancellationToken) -> PipelineResult<Project> {
        let writer = StateWriter::new(
            project_id,
            Arc::clone(&self.store),
            Arc::clone(&self.publisher),
        );

        match self.drive(&writer, &cancel).await {
            Ok(project) => Ok(project),
            Err(e) => {
                error!(project_id = %project_id, error = %e, "Pipeline run failed");
                if let Err(record_err) = writer
                    .set_project_status(
                        ProjectStatus::Error,
                        None,
                        Some(format!("pipeline failure: {e}")),
                    )
                    .await
                {
                    error!(
                        project_id = %project_id,
                        error = %record_err,
                        "Could not record pipeline failure"
                    );
                }
                Err(e)
            }
        }
    }

    async fn drive(&self, writer: &StateWriter, cancel: &CancellationToken) -> PipelineResult<Project> {
        let project = writer.load().await?;
        let project_id = project.id;
        if project.status != ProjectStatus::Generating {
            return Err(PipelineError::invalid_state(
                project_id,
                project.status,
                "run the pipeline",
            ));
        }
        info!(project_id = %project_id, clips = project.clip_count, "Pipeline run started");

        for clip in &project.clips {
            if cancel.is_cancelled() {
                return self.cancel(writer).await;
            }
            if self.worker.run(writer, clip, cancel).await? == ClipOutcome::Cancelled {
                return self.cancel(writer).await;
            }
        }

        let project = writer.load().await?;
        let videos: Vec<MediaRef> = project
            .clips
            .iter()
            .filter(|clip| clip.status == ClipStatus::Done)
            .filter_map(|clip| clip.video_ref.clone())
            .collect();

        if videos.is_empty() {
            error!(project_id = %project_id, "No clip was generated; skipping compilation");
            return writer
                .set_project_status(
                    ProjectStatus::Error,
                    None,
                    Some("no clip was generated successfully".to_string()),
                )
                .await;
        }

        if cancel.is_cancelled() {
            return self.cancel(writer).await;
        }

        writer
            .set_project_status(ProjectStatus::Compiling, None, None)
            .await?;
        info!(project_id = %project_id, clips = videos.len(), "Compiling final video");

        let provider = &self.provider;
        let clips: &[MediaRef] = &videos;
        let outcome = retry_with_backoff(
            &self.policy,
            cancel,
            move || provider.compile_video(clips),
            move |attempt, message| async move {
                warn!(project_id = %project_id, attempt, error = %message, "Retrying compilation");
                Ok(())
            },
        )
        .await?;

        match outcome {
            RetryOutcome::Success(final_video) => {
                info!(project_id = %project_id, final_video = %final_video, "Project completed");
                writer
                    .set_project_status(ProjectStatus::Completed, Some(final_video), None)
                    .await
            }
            RetryOutcome::Failed { error, attempts } => {
                error!(project_id = %project_id, attempts, error = %error, "Compilation failed");
                writer
                    .set_project_status(
                        ProjectStatus::Error,
                        None,
                        Some(format!("compilation failed: {error}")),
                    )
                    .await
            }
            RetryOutcome::Cancelled => self.cancel(writer).await,
        }
    }

    async fn cancel(&self, writer: &StateWriter) -> PipelineResult<Project> {
        info!(project_id = %writer.project_id(), "Pipeline run cancelled");
        writer.cancel_open_clips().await?;
        writer
            .set_project_status(ProjectStatus::Cancelled, None, None)
            .await
    }
}
