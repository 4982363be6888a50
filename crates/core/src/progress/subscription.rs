//! Snapshot streams for progress observers.

use crate::state::store::ProjectStore;
use async_stream::stream;
use cf_protocol::{Event, Project, ProjectSnapshot};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::Stream;
use uuid::Uuid;

/// Ordered snapshots of one project, ending after a terminal snapshot.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = ProjectSnapshot> + Send>>;

/// Build the observer stream for a project.
///
/// `receiver` must be subscribed before `current` is read from the store so
/// no transition falls between the two. The stream yields `current` first,
/// then every newer snapshot; snapshots at or below the last yielded
/// revision are skipped. After a lag, or when the channel closes early, the
/// store is re-read so the observer still converges on the latest state.
pub fn snapshot_stream(
    store: Arc<dyn ProjectStore>,
    project_id: Uuid,
    current: Project,
    mut receiver: broadcast::Receiver<Event>,
) -> SnapshotStream {
    Box::pin(stream! {
        let mut last_revision = current.revision;
        let mut finished = current.status.is_terminal();
        yield current.snapshot();

        while !finished {
            let snapshot = match receiver.recv().await {
                Ok(event) => Some(event.into_snapshot()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(project_id = %project_id, skipped, "Progress receiver lagged; re-reading store");
                    store.get(project_id).await.ok().map(|p| p.snapshot())
                }
                Err(RecvError::Closed) => {
                    finished = true;
                    store.get(project_id).await.ok().map(|p| p.snapshot())
                }
            };

            let Some(snapshot) = snapshot else {
                // Deleted while observed.
                break;
            };
            if snapshot.revision <= last_revision {
                continue;
            }

            last_revision = snapshot.revision;
            finished |= snapshot.status.is_terminal();
            yield snapshot;
        }
    })
}
