//! Pipeline manager: the entry point for every project operation.
//!
//! The PipelineManager owns the project store, the progress publisher and
//! the registry of active runs. Each started project runs in its own tokio
//! task; the registry entry (cancel token plus completion signal) is
//! inserted on start and removed by the task itself when it finishes.

use crate::config::error::ConfigError;
use crate::engine::PipelineEngine;
use crate::error::{PipelineError, PipelineResult};
use crate::generation::GenerationProvider;
use crate::progress::{snapshot_stream, ProgressPublisher, SnapshotStream};
use crate::script;
use crate::state::store::{InMemoryProjectStore, JsonFileProjectStore, ProjectStore};
use crate::state::transitions::{mark_interrupted, StateWriter};
use crate::worker::RetryPolicy;
use cf_protocol::{
    Clip, ClipStatus, Event, GlobalConfig, NewProject, Product, Project, ProjectSnapshot,
    ProjectStatus, PromptClip, ScriptStyle,
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Registry entry of one active run.
struct RunHandle {
    cancel: CancellationToken,
    finished: watch::Receiver<bool>,
}

/// Manages projects and their pipeline runs.
///
/// The PipelineManager provides a centralized interface for:
/// - Creating, editing and deleting projects
/// - Starting and cancelling generation
/// - Subscribing to progress
/// - Querying project state
pub struct PipelineManager {
    store: Arc<dyn ProjectStore>,
    publisher: Arc<ProgressPublisher>,
    provider: Arc<dyn GenerationProvider>,
    engine: Arc<PipelineEngine>,

    /// Active runs, indexed by project id.
    runs: Arc<Mutex<HashMap<Uuid, RunHandle>>>,
}

impl PipelineManager {
    /// Create a manager over an existing store.
    ///
    /// # Arguments
    ///
    /// * `provider` - The generation capability
    /// * `store` - Project records
    /// * `config` - Retry and progress settings
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        store: Arc<dyn ProjectStore>,
        config: &GlobalConfig,
    ) -> Self {
        let publisher = Arc::new(ProgressPublisher::new(config.progress.channel_capacity));
        let engine = Arc::new(PipelineEngine::new(
            Arc::clone(&provider),
            Arc::clone(&store),
            Arc::clone(&publisher),
            RetryPolicy::from(config.retry),
        ));

        Self {
            store,
            publisher,
            provider,
            engine,
            runs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a manager with an in-memory store.
    pub fn in_memory(provider: Arc<dyn GenerationProvider>, config: &GlobalConfig) -> Self {
        Self::new(provider, Arc::new(InMemoryProjectStore::new()), config)
    }

    /// Create a manager with the store described by `config.store`.
    ///
    /// A relative store directory is resolved against `root`. Projects left
    /// active by a previous process are recovered before returning.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store directory cannot be opened.
    pub async fn from_config(
        provider: Arc<dyn GenerationProvider>,
        root: &Path,
        config: &GlobalConfig,
    ) -> PipelineResult<Self> {
        let store: Arc<dyn ProjectStore> = match config.store.dir.as_deref() {
            Some(dir) if dir.trim().is_empty() => {
                return Err(ConfigError::InvalidConfig {
                    path: root.join(".clipforge/config.toml"),
                    reason: "store.dir must not be empty".to_string(),
                }
                .into());
            }
            Some(dir) => Arc::new(JsonFileProjectStore::open(root.join(dir))?),
            None => Arc::new(InMemoryProjectStore::new()),
        };

        let manager = Self::new(provider, store, config);
        manager.recover_interrupted().await?;
        Ok(manager)
    }

    /// Create a project in `draft`.
    ///
    /// # Returns
    ///
    /// The id of the new project.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the name is blank.
    pub async fn create_project(&self, new_project: NewProject) -> PipelineResult<Uuid> {
        let name = validate_name(&new_project.name)?;
        let now = Utc::now();
        let clips = new_project
            .clips
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Clip {
                index,
                image_prompt: spec.image_prompt,
                video_prompt: spec.video_prompt,
                voice_line: spec.voice_line,
                status: ClipStatus::Pending,
                retry_count: 0,
                image_ref: None,
                video_ref: None,
                failure: None,
            })
            .collect();

        let project = self
            .store
            .insert(Project {
                id: Uuid::new_v4(),
                name,
                status: ProjectStatus::Draft,
                clips,
                style: new_project.style,
                created_at: now,
                updated_at: now,
                clip_count: 0,
                completed_clips: 0,
                revision: 0,
                final_video: None,
                error: None,
            })
            .await?;

        info!(project_id = %project.id, name = %project.name, clips = project.clip_count, "Project created");
        Ok(project.id)
    }

    /// Create a project whose clips are generated from a script style.
    ///
    /// # Errors
    ///
    /// `UnrecognizedStyle` for an unknown tag, `InvalidInput` for a blank name.
    pub async fn create_project_from_script(
        &self,
        name: &str,
        style: &str,
        product: &Product,
        avatar_description: &str,
    ) -> PipelineResult<Uuid> {
        let style: ScriptStyle = style.parse()?;
        let clips = script::generate_for_style(style, product, avatar_description)
            .into_iter()
            .map(Into::into)
            .collect();

        self.create_project(NewProject {
            name: name.to_string(),
            clips,
            style: Some(style),
        })
        .await
    }

    /// Generate script clips without creating a project.
    pub fn generate_script(
        &self,
        style: &str,
        product: &Product,
        avatar_description: &str,
    ) -> PipelineResult<Vec<PromptClip>> {
        Ok(script::generate_script(style, product, avatar_description)?)
    }

    /// Rename a `draft` project.
    pub async fn rename_project(&self, id: Uuid, name: &str) -> PipelineResult<ProjectSnapshot> {
        let name = validate_name(name)?;
        let project = self
            .store
            .update(
                id,
                Box::new(move |project| {
                    require_draft(project, "rename")?;
                    project.name = name;
                    Ok(())
                }),
            )
            .await?;
        Ok(project.snapshot())
    }

    /// Reorder the clips of a `draft` project.
    ///
    /// `order[i]` is the current index of the clip that moves to position
    /// `i`. Indices are renumbered to stay contiguous.
    ///
    /// # Errors
    ///
    /// `InvalidState` once the project left `draft`; `InvalidInput` if
    /// `order` is not a permutation of the current indices.
    pub async fn reorder_clips(&self, id: Uuid, order: Vec<usize>) -> PipelineResult<ProjectSnapshot> {
        let project = self
            .store
            .update(
                id,
                Box::new(move |project| {
                    require_draft(project, "reorder clips")?;
                    if !is_permutation(&order, project.clips.len()) {
                        return Err(PipelineError::InvalidInput(format!(
                            "clip order {order:?} is not a permutation of 0..{}",
                            project.clips.len()
                        )));
                    }

                    let mut slots: Vec<Option<Clip>> =
                        std::mem::take(&mut project.clips).into_iter().map(Some).collect();
                    project.clips = order
                        .iter()
                        .enumerate()
                        .filter_map(|(index, &from)| {
                            slots[from].take().map(|mut clip| {
                                clip.index = index;
                                clip
                            })
                        })
                        .collect();
                    Ok(())
                }),
            )
            .await?;
        Ok(project.snapshot())
    }

    /// Start generating a project.
    ///
    /// Returns once the project is `generating` and its run task is spawned;
    /// the run continues in the background.
    ///
    /// # Errors
    ///
    /// Checked in order: `ProjectNotFound`, `InvalidState` (not `draft`),
    /// `NoEligibleClips` (project stays `draft`), `ProviderUnavailable`.
    pub async fn start_generation(&self, id: Uuid) -> PipelineResult<()> {
        let project = self.store.get(id).await?;
        require_draft(&project, "start generation")?;
        if !project.has_eligible_clip() {
            return Err(PipelineError::NoEligibleClips(id));
        }
        if !self.provider.check_availability().await {
            return Err(PipelineError::ProviderUnavailable(
                "provider did not pass its availability check".to_string(),
            ));
        }

        let mut runs = self.runs.lock().await;
        let writer = StateWriter::new(id, Arc::clone(&self.store), Arc::clone(&self.publisher));
        writer.start_generation().await?;

        let cancel = CancellationToken::new();
        let (finished_tx, finished_rx) = watch::channel(false);
        runs.insert(
            id,
            RunHandle {
                cancel: cancel.clone(),
                finished: finished_rx,
            },
        );

        let engine = Arc::clone(&self.engine);
        let registry = Arc::clone(&self.runs);
        let span = info_span!("project_run", project_id = %id);
        tokio::spawn(
            async move {
                if let Ok(project) = engine.run(id, cancel).await {
                    info!(status = %project.status, completed_clips = project.completed_clips, "Run finished");
                }
                registry.lock().await.remove(&id);
                let _ = finished_tx.send(true);
            }
            .instrument(span),
        );

        info!(project_id = %id, "Generation started");
        Ok(())
    }

    /// Request cancellation of an active run.
    ///
    /// The run stops at the next stage boundary or backoff; in-flight
    /// provider calls complete first.
    pub async fn cancel_generation(&self, id: Uuid) -> PipelineResult<()> {
        if let Some(run) = self.runs.lock().await.get(&id) {
            run.cancel.cancel();
            info!(project_id = %id, "Cancellation requested");
            return Ok(());
        }

        let project = self.store.get(id).await?;
        Err(PipelineError::invalid_state(id, project.status, "cancel generation"))
    }

    /// Wait until the active run of a project, if any, has finished.
    ///
    /// # Returns
    ///
    /// The project record after the run.
    pub async fn wait_for(&self, id: Uuid) -> PipelineResult<Project> {
        let finished = self
            .runs
            .lock()
            .await
            .get(&id)
            .map(|run| run.finished.clone());

        if let Some(mut finished) = finished {
            // An Err means the run task is gone, which also means it is done.
            let _ = finished.wait_for(|done| *done).await;
        }
        self.store.get(id).await
    }

    /// Subscribe to a project's progress.
    ///
    /// The stream yields the current snapshot first, then every newer one in
    /// order, and ends after a terminal snapshot.
    pub async fn subscribe(&self, id: Uuid) -> PipelineResult<SnapshotStream> {
        let receiver = self.publisher.subscribe(id);
        let current = match self.store.get(id).await {
            Ok(project) => project,
            Err(e) => {
                self.publisher.close(id);
                return Err(e);
            }
        };
        if current.status.is_terminal() {
            self.publisher.close(id);
        }
        Ok(snapshot_stream(Arc::clone(&self.store), id, current, receiver))
    }

    pub async fn get_project(&self, id: Uuid) -> PipelineResult<ProjectSnapshot> {
        Ok(self.store.get(id).await?.snapshot())
    }

    /// Full record, including prompts and media references.
    pub async fn get_project_record(&self, id: Uuid) -> PipelineResult<Project> {
        self.store.get(id).await
    }

    /// Snapshots of every project, oldest first.
    pub async fn list_projects(&self) -> Vec<ProjectSnapshot> {
        self.store
            .list()
            .await
            .iter()
            .map(Project::snapshot)
            .collect()
    }

    /// Delete a project that is not `generating` or `compiling`.
    pub async fn delete_project(&self, id: Uuid) -> PipelineResult<()> {
        self.store
            .remove(
                id,
                Box::new(|project| {
                    if project.status.is_active() {
                        return Err(PipelineError::invalid_state(
                            project.id,
                            project.status,
                            "delete",
                        ));
                    }
                    Ok(())
                }),
            )
            .await?;
        self.publisher.close(id);
        info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Move projects left `generating`/`compiling` by a previous process to
    /// `error`. Runs are never resumed silently.
    ///
    /// # Returns
    ///
    /// The ids of the recovered projects.
    pub async fn recover_interrupted(&self) -> PipelineResult<Vec<Uuid>> {
        // Held for the whole scan so no run can start between the check and the write.
        let runs = self.runs.lock().await;
        let mut recovered = Vec::new();

        for project in self.store.list().await {
            if !project.status.is_active() || runs.contains_key(&project.id) {
                continue;
            }

            let updated = self
                .store
                .update(
                    project.id,
                    Box::new(|project| {
                        mark_interrupted(project);
                        Ok(())
                    }),
                )
                .await?;
            warn!(project_id = %updated.id, "Recovered interrupted project");
            self.publisher.publish(Event::ProjectStatusUpdate {
                project_id: updated.id,
                status: updated.status,
                snapshot: updated.snapshot(),
            });
            recovered.push(updated.id);
        }

        Ok(recovered)
    }

    /// Number of runs currently registered.
    pub async fn active_run_count(&self) -> usize {
        self.runs.lock().await.len()
    }
}

fn validate_name(name: &str) -> PipelineResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PipelineError::InvalidInput(
            "project name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn require_draft(project: &Project, operation: &'static str) -> PipelineResult<()> {
    if project.status == ProjectStatus::Draft {
        Ok(())
    } else {
        Err(PipelineError::invalid_state(
            project.id,
            project.status,
            operation,
        ))
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    order
        .iter()
        .all(|&index| index < len && !std::mem::replace(&mut seen[index], true))
}
