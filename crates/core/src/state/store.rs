//! Project store: the single source of truth for project records.
//!
//! Writes are serialized per project through one `tokio::sync::Mutex` per
//! entry; different projects only share the map lookup. Every committed
//! write bumps `revision`, refreshes `updated_at` and recomputes the clip
//! counters, so observers can order and deduplicate snapshots.

use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use cf_protocol::Project;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;
use walkdir::WalkDir;

/// A change applied to a copy of the project; returning an error discards it.
pub type ProjectMutator = Box<dyn FnOnce(&mut Project) -> PipelineResult<()> + Send>;

/// A precondition checked under the project's lock before removal.
pub type RemoveGuard = Box<dyn FnOnce(&Project) -> PipelineResult<()> + Send>;

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Add a new project. Fails if the id is already taken.
    async fn insert(&self, project: Project) -> PipelineResult<Project>;

    async fn get(&self, id: Uuid) -> PipelineResult<Project>;

    /// Apply `mutator` and commit the result atomically for this project.
    ///
    /// # Returns
    ///
    /// The committed project, with its new revision.
    ///
    /// # Errors
    ///
    /// `ProjectNotFound`, whatever the mutator returns, or `Storage` if the
    /// record cannot be persisted. The stored record is unchanged on error.
    async fn update(&self, id: Uuid, mutator: ProjectMutator) -> PipelineResult<Project>;

    /// Remove a project if `guard` accepts it.
    async fn remove(&self, id: Uuid, guard: RemoveGuard) -> PipelineResult<Project>;

    /// All projects, oldest first.
    async fn list(&self) -> Vec<Project>;
}

type Entry = Arc<Mutex<Option<Project>>>;

/// Entries shared by both store implementations. A removed entry holds
/// `None` so writers that looked it up before removal see `ProjectNotFound`.
#[derive(Default)]
struct ProjectTable {
    entries: RwLock<HashMap<Uuid, Entry>>,
}

impl ProjectTable {
    fn entry(&self, id: Uuid) -> PipelineResult<Entry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&id)
            .cloned()
            .ok_or(PipelineError::ProjectNotFound(id))
    }

    fn load(&self, project: Project) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(project.id, Arc::new(Mutex::new(Some(project))));
    }

    async fn insert(
        &self,
        mut project: Project,
        persist: impl FnOnce(&Project) -> PipelineResult<()>,
    ) -> PipelineResult<Project> {
        project.recount();
        let entry = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if entries.contains_key(&project.id) {
                return Err(PipelineError::InvalidInput(format!(
                    "project {} already exists",
                    project.id
                )));
            }
            let entry: Entry = Arc::new(Mutex::new(None));
            entries.insert(project.id, Arc::clone(&entry));
            entry
        };

        let mut slot = entry.lock().await;
        if let Err(e) = persist(&project) {
            drop(slot);
            self.forget(project.id);
            return Err(e);
        }
        *slot = Some(project.clone());
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> PipelineResult<Project> {
        let entry = self.entry(id)?;
        let slot = entry.lock().await;
        slot.clone().ok_or(PipelineError::ProjectNotFound(id))
    }

    async fn update(
        &self,
        id: Uuid,
        mutator: ProjectMutator,
        persist: impl FnOnce(&Project) -> PipelineResult<()>,
    ) -> PipelineResult<Project> {
        let entry = self.entry(id)?;
        let mut slot = entry.lock().await;
        let current = slot.as_ref().ok_or(PipelineError::ProjectNotFound(id))?;

        let mut next = current.clone();
        mutator(&mut next)?;
        next.id = current.id;
        next.revision = current.revision + 1;
        next.updated_at = Utc::now();
        next.recount();

        persist(&next)?;
        *slot = Some(next.clone());
        Ok(next)
    }

    async fn remove(
        &self,
        id: Uuid,
        guard: RemoveGuard,
        unpersist: impl FnOnce(Uuid) -> PipelineResult<()>,
    ) -> PipelineResult<Project> {
        let entry = self.entry(id)?;
        let mut slot = entry.lock().await;
        let current = slot.as_ref().ok_or(PipelineError::ProjectNotFound(id))?;
        guard(current)?;
        unpersist(id)?;

        let removed = slot.take().ok_or(PipelineError::ProjectNotFound(id))?;
        drop(slot);
        self.forget(id);
        Ok(removed)
    }

    async fn list(&self) -> Vec<Project> {
        let entries: Vec<Entry> = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries.values().cloned().collect()
        };

        let mut projects = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(project) = entry.lock().await.clone() {
                projects.push(project);
            }
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        projects
    }

    fn forget(&self, id: Uuid) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&id);
    }
}

/// Store that keeps projects in memory only.
#[derive(Default)]
pub struct InMemoryProjectStore {
    table: ProjectTable,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn insert(&self, project: Project) -> PipelineResult<Project> {
        self.table.insert(project, |_| Ok(())).await
    }

    async fn get(&self, id: Uuid) -> PipelineResult<Project> {
        self.table.get(id).await
    }

    async fn update(&self, id: Uuid, mutator: ProjectMutator) -> PipelineResult<Project> {
        self.table.update(id, mutator, |_| Ok(())).await
    }

    async fn remove(&self, id: Uuid, guard: RemoveGuard) -> PipelineResult<Project> {
        self.table.remove(id, guard, |_| Ok(())).await
    }

    async fn list(&self) -> Vec<Project> {
        self.table.list().await
    }
}

/// Store that writes every committed project to `<dir>/<id>.json`.
///
/// Records are written to a temporary file in the same directory and then
/// renamed over the old one, so a crash never leaves a half-written record.
pub struct JsonFileProjectStore {
    dir: PathBuf,
    table: ProjectTable,
}

impl JsonFileProjectStore {
    /// Open (creating if needed) a store directory and load every record in it.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the directory cannot be created or read, or if a
    /// record does not parse.
    pub fn open(dir: impl Into<PathBuf>) -> PipelineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PipelineError::storage(&dir, e))?;

        let table = ProjectTable::default();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| PipelineError::storage(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let content =
                std::fs::read_to_string(path).map_err(|e| PipelineError::storage(path, e))?;
            let project: Project =
                serde_json::from_str(&content).map_err(|e| PipelineError::storage(path, e))?;
            table.load(project);
        }

        tracing::debug!(dir = %dir.display(), "Opened project store");
        Ok(Self { dir, table })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(dir: &Path, id: Uuid) -> PathBuf {
        dir.join(format!("{id}.json"))
    }

    fn write_record(dir: &Path, project: &Project) -> PipelineResult<()> {
        let path = Self::record_path(dir, project.id);
        let json =
            serde_json::to_vec_pretty(project).map_err(|e| PipelineError::storage(&path, e))?;

        let mut file =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| PipelineError::storage(dir, e))?;
        file.write_all(&json)
            .map_err(|e| PipelineError::storage(file.path(), e))?;
        file.persist(&path)
            .map_err(|e| PipelineError::storage(&path, e.error))?;
        Ok(())
    }

    fn delete_record(dir: &Path, id: Uuid) -> PipelineResult<()> {
        let path = Self::record_path(dir, id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::storage(&path, e)),
        }
    }
}

#[async_trait]
impl ProjectStore for JsonFileProjectStore {
    async fn insert(&self, project: Project) -> PipelineResult<Project> {
        self.table
            .insert(project, |p| Self::write_record(&self.dir, p))
            .await
    }

    async fn get(&self, id: Uuid) -> PipelineResult<Project> {
        self.table.get(id).await
    }

    async fn update(&self, id: Uuid, mutator: ProjectMutator) -> PipelineResult<Project> {
        self.table
            .update(id, mutator, |p| Self::write_record(&self.dir, p))
            .await
    }

    async fn remove(&self, id: Uuid, guard: RemoveGuard) -> PipelineResult<Project> {
        self.table
            .remove(id, guard, |id| Self::delete_record(&self.dir, id))
            .await
    }

    async fn list(&self) -> Vec<Project> {
        self.table.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_protocol::{Clip, ClipStatus, ProjectStatus};
    use tempfile::tempdir;

    fn project(name: &str) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: ProjectStatus::Draft,
            clips: vec![Clip {
                index: 0,
                image_prompt: "a kitchen".to_string(),
                video_prompt: String::new(),
                voice_line: None,
                status: ClipStatus::Pending,
                retry_count: 0,
                image_ref: None,
                video_ref: None,
                failure: None,
            }],
            style: None,
            created_at: now,
            updated_at: now,
            clip_count: 0,
            completed_clips: 0,
            revision: 0,
            final_video: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryProjectStore::new();
        let inserted = store.insert(project("a")).await.unwrap();
        assert_eq!(inserted.clip_count, 1);

        let fetched = store.get(inserted.id).await.unwrap();
        assert_eq!(fetched, inserted);

        let missing = store.get(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(PipelineError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryProjectStore::new();
        let p = project("a");
        store.insert(p.clone()).await.unwrap();
        assert!(matches!(
            store.insert(p).await,
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_bumps_revision_and_counters() {
        let store = InMemoryProjectStore::new();
        let p = store.insert(project("a")).await.unwrap();

        let updated = store
            .update(
                p.id,
                Box::new(|project| {
                    project.clips[0].status = ClipStatus::Done;
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated.revision, p.revision + 1);
        assert_eq!(updated.completed_clips, 1);
        assert!(updated.updated_at >= p.updated_at);
    }

    #[tokio::test]
    async fn test_failed_mutator_leaves_record_untouched() {
        let store = InMemoryProjectStore::new();
        let p = store.insert(project("a")).await.unwrap();

        let result = store
            .update(
                p.id,
                Box::new(|project| {
                    project.name = "changed".to_string();
                    Err(PipelineError::InvalidInput("nope".to_string()))
                }),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(store.get(p.id).await.unwrap(), p);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let store = Arc::new(InMemoryProjectStore::new());
        let p = store.insert(project("a")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update(
                        p.id,
                        Box::new(|project| {
                            project.clips[0].retry_count += 1;
                            Ok(())
                        }),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let final_state = store.get(p.id).await.unwrap();
        assert_eq!(final_state.clips[0].retry_count, 20);
        assert_eq!(final_state.revision, p.revision + 20);
    }

    #[tokio::test]
    async fn test_remove_respects_guard() {
        let store = InMemoryProjectStore::new();
        let p = store.insert(project("a")).await.unwrap();

        let refused = store
            .remove(
                p.id,
                Box::new(|_| Err(PipelineError::InvalidInput("busy".to_string()))),
            )
            .await;
        assert!(refused.is_err());
        assert!(store.get(p.id).await.is_ok());

        store.remove(p.id, Box::new(|_| Ok(()))).await.unwrap();
        assert!(matches!(
            store.get(p.id).await,
            Err(PipelineError::ProjectNotFound(_))
        ));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_json_store_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let id = {
            let store = JsonFileProjectStore::open(dir.path()).unwrap();
            let p = store.insert(project("persisted")).await.unwrap();
            store
                .update(
                    p.id,
                    Box::new(|project| {
                        project.status = ProjectStatus::Generating;
                        Ok(())
                    }),
                )
                .await
                .unwrap();
            p.id
        };

        assert!(dir.path().join(format!("{id}.json")).exists());

        let reopened = JsonFileProjectStore::open(dir.path()).unwrap();
        let p = reopened.get(id).await.unwrap();
        assert_eq!(p.name, "persisted");
        assert_eq!(p.status, ProjectStatus::Generating);
        assert_eq!(p.revision, 1);

        reopened.remove(id, Box::new(|_| Ok(()))).await.unwrap();
        assert!(!dir.path().join(format!("{id}.json")).exists());
    }

    #[tokio::test]
    async fn test_json_store_rejects_corrupt_record() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(
            JsonFileProjectStore::open(dir.path()),
            Err(PipelineError::Storage { .. })
        ));
    }
}
