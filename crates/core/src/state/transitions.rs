//! Project and clip state transitions.
//!
//! Every function here commits one transition through the [`ProjectStore`]
//! and then publishes the matching [`Event`] carrying the committed
//! snapshot. Illegal transitions are rejected inside the store mutator, so
//! the record is never left in a state the state machine does not allow.

use crate::error::{PipelineError, PipelineResult};
use crate::progress::ProgressPublisher;
use crate::state::store::ProjectStore;
use cf_protocol::{
    ClipFailure, ClipStatus, Event, FailureKind, GenerationStage, MediaRef, Project,
    ProjectStatus,
};
use std::sync::Arc;
use uuid::Uuid;

/// Writes the transitions of one project and publishes each of them.
#[derive(Clone)]
pub struct StateWriter {
    project_id: Uuid,
    store: Arc<dyn ProjectStore>,
    publisher: Arc<ProgressPublisher>,
}

impl StateWriter {
    pub fn new(
        project_id: Uuid,
        store: Arc<dyn ProjectStore>,
        publisher: Arc<ProgressPublisher>,
    ) -> Self {
        Self {
            project_id,
            store,
            publisher,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    /// Current committed record.
    pub async fn load(&self) -> PipelineResult<Project> {
        self.store.get(self.project_id).await
    }

    /// Move a `draft` project with at least one eligible clip to `generating`.
    ///
    /// Both preconditions are checked again under the store lock.
    pub async fn start_generation(&self) -> PipelineResult<Project> {
        let project = self
            .store
            .update(
                self.project_id,
                Box::new(|project| {
                    if project.status != ProjectStatus::Draft {
                        return Err(PipelineError::invalid_state(
                            project.id,
                            project.status,
                            "start generation",
                        ));
                    }
                    if !project.has_eligible_clip() {
                        return Err(PipelineError::NoEligibleClips(project.id));
                    }
                    project.status = ProjectStatus::Generating;
                    project.error = None;
                    Ok(())
                }),
            )
            .await?;

        self.publisher.publish(Event::ProjectStatusUpdate {
            project_id: self.project_id,
            status: ProjectStatus::Generating,
            snapshot: project.snapshot(),
        });
        Ok(project)
    }

    /// Move the project to `status`, publishing a `ProjectStatusUpdate`.
    ///
    /// `final_video` and `error` are recorded alongside when given.
    pub async fn set_project_status(
        &self,
        status: ProjectStatus,
        final_video: Option<MediaRef>,
        error: Option<String>,
    ) -> PipelineResult<Project> {
        let project = self
            .store
            .update(
                self.project_id,
                Box::new(move |project| {
                    check_project_transition(project, status)?;
                    project.status = status;
                    if final_video.is_some() {
                        project.final_video = final_video;
                    }
                    if error.is_some() {
                        project.error = error;
                    }
                    Ok(())
                }),
            )
            .await?;

        self.publisher.publish(Event::ProjectStatusUpdate {
            project_id: self.project_id,
            status,
            snapshot: project.snapshot(),
        });
        Ok(project)
    }

    /// Move a clip into the running status of `stage`.
    pub async fn begin_stage(&self, index: usize, stage: GenerationStage) -> PipelineResult<Project> {
        self.set_clip_status(index, stage.clip_status(), |_| {}).await
    }

    /// Record the stage-1 result on the clip.
    pub async fn record_image(&self, index: usize, image: MediaRef) -> PipelineResult<Project> {
        self.update_clip(index, move |clip| {
            clip.image_ref = Some(image);
            Ok(())
        })
        .await
    }

    /// Mark a clip `done` with its video.
    pub async fn finish_clip(&self, index: usize, video: MediaRef) -> PipelineResult<Project> {
        self.set_clip_status(index, ClipStatus::Done, move |clip| {
            clip.video_ref = Some(video);
        })
        .await
    }

    /// Mark a clip `failed` with the failure detail.
    pub async fn fail_clip(&self, index: usize, failure: ClipFailure) -> PipelineResult<Project> {
        self.set_clip_status(index, ClipStatus::Failed, move |clip| {
            clip.failure = Some(failure);
        })
        .await
    }

    /// Count one retry of a clip stage and publish a `ClipRetry`.
    pub async fn record_retry(
        &self,
        index: usize,
        stage: GenerationStage,
        error: String,
    ) -> PipelineResult<Project> {
        let project = self
            .update_clip(index, |clip| {
                clip.retry_count += 1;
                Ok(())
            })
            .await?;

        let retry_count = project.clip(index).map_or(0, |clip| clip.retry_count);
        self.publisher.publish(Event::ClipRetry {
            project_id: self.project_id,
            clip_index: index,
            stage,
            retry_count,
            error,
            snapshot: project.snapshot(),
        });
        Ok(project)
    }

    /// Mark every non-terminal clip `cancelled`, in index order.
    pub async fn cancel_open_clips(&self) -> PipelineResult<()> {
        let project = self.load().await?;
        for clip in project.clips.iter().filter(|clip| !clip.status.is_terminal()) {
            self.set_clip_status(clip.index, ClipStatus::Cancelled, |_| {})
                .await?;
        }
        Ok(())
    }

    async fn set_clip_status(
        &self,
        index: usize,
        status: ClipStatus,
        apply: impl FnOnce(&mut cf_protocol::Clip) + Send + 'static,
    ) -> PipelineResult<Project> {
        let project_id = self.project_id;
        let project = self
            .update_clip(index, move |clip| {
                if !clip.status.can_transition_to(status) {
                    return Err(PipelineError::IllegalTransition {
                        project_id,
                        detail: format!("clip {index}: {} -> {status}", clip.status),
                    });
                }
                clip.status = status;
                apply(clip);
                Ok(())
            })
            .await?;

        let retry_count = project.clip(index).map_or(0, |clip| clip.retry_count);
        self.publisher.publish(Event::ClipStatusUpdate {
            project_id: self.project_id,
            clip_index: index,
            status,
            retry_count,
            snapshot: project.snapshot(),
        });
        Ok(project)
    }

    async fn update_clip(
        &self,
        index: usize,
        apply: impl FnOnce(&mut cf_protocol::Clip) -> PipelineResult<()> + Send + 'static,
    ) -> PipelineResult<Project> {
        let project_id = self.project_id;
        self.store
            .update(
                project_id,
                Box::new(move |project| {
                    let clip = project.clip_mut(index).ok_or_else(|| {
                        PipelineError::InvalidInput(format!(
                            "project {project_id} has no clip {index}"
                        ))
                    })?;
                    apply(clip)
                }),
            )
            .await
    }
}

fn check_project_transition(project: &Project, next: ProjectStatus) -> PipelineResult<()> {
    if project.status.can_transition_to(next) {
        return Ok(());
    }
    Err(PipelineError::IllegalTransition {
        project_id: project.id,
        detail: format!("project: {} -> {next}", project.status),
    })
}

/// Store mutator used at startup for runs that died with the process.
///
/// In-flight clips fail as `interrupted`, clips that never started are
/// cancelled, and the project moves to `error`. Returns `false` when the
/// project was not active and nothing changed.
pub fn mark_interrupted(project: &mut Project) -> bool {
    if !project.status.is_active() {
        return false;
    }

    for clip in &mut project.clips {
        match clip.status {
            ClipStatus::ImageGenerating | ClipStatus::VideoGenerating => {
                let stage = match clip.status {
                    ClipStatus::ImageGenerating => GenerationStage::Image,
                    _ => GenerationStage::Video,
                };
                clip.status = ClipStatus::Failed;
                clip.failure = Some(ClipFailure {
                    kind: FailureKind::Interrupted,
                    stage: Some(stage),
                    message: "generation was interrupted by a restart".to_string(),
                });
            }
            ClipStatus::Pending => clip.status = ClipStatus::Cancelled,
            _ => {}
        }
    }

    project.status = ProjectStatus::Error;
    project.error = Some("interrupted: the service stopped during generation".to_string());
    true
}
