//! Per-project progress fan-out backed by `tokio::sync::broadcast`.
//!
//! [`ProgressPublisher`] keeps one broadcast channel per project, created on
//! first subscribe. Publishing never blocks: with no channel or no
//! receivers the event is dropped, and a receiver that falls more than
//! `capacity` events behind observes `RecvError::Lagged` and skips ahead.

use cf_protocol::Event;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default buffer capacity of each project channel.
pub const DEFAULT_CAPACITY: usize = 64;

pub struct ProgressPublisher {
    capacity: usize,
    channels: Mutex<HashMap<Uuid, broadcast::Sender<Event>>>,
}

impl ProgressPublisher {
    /// Create a publisher whose per-project channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Publish an event to the current subscribers of its project.
    ///
    /// A terminal project snapshot closes the project's channel after the
    /// event is sent, so receivers drain it and then see `Closed`. A channel
    /// whose receivers have all been dropped is removed as well.
    pub fn publish(&self, event: Event) {
        let project_id = event.project_id();
        let terminal = event.snapshot().status.is_terminal();

        let mut channels = self.channels();
        let mut receivers = 0;
        if let Some(sender) = channels.get(&project_id) {
            // Ignore the SendError: it only means there are zero receivers.
            receivers = sender.send(event).unwrap_or(0);
            tracing::debug!(project_id = %project_id, receivers, "Published progress event");
        }
        if terminal || receivers == 0 {
            channels.remove(&project_id);
        }
    }

    /// Subscribe to the events of one project.
    ///
    /// Channels of other projects with no receivers left are dropped here.
    pub fn subscribe(&self, project_id: Uuid) -> broadcast::Receiver<Event> {
        let mut channels = self.channels();
        channels.retain(|id, sender| *id == project_id || sender.receiver_count() > 0);
        channels
            .entry(project_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drop the project's channel. Existing receivers end after draining.
    pub fn close(&self, project_id: Uuid) {
        if self.channels().remove(&project_id).is_some() {
            tracing::debug!(project_id = %project_id, "Closed progress channel");
        }
    }

    /// Number of projects with an open channel.
    pub fn channel_count(&self) -> usize {
        self.channels().len()
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<Uuid, broadcast::Sender<Event>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProgressPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_protocol::{ProjectSnapshot, ProjectStatus};
    use tokio::sync::broadcast::error::RecvError;

    fn event(project_id: Uuid, status: ProjectStatus, revision: u64) -> Event {
        Event::ProjectStatusUpdate {
            project_id,
            status,
            snapshot: ProjectSnapshot {
                project_id,
                name: "p".to_string(),
                status,
                revision,
                clip_count: 0,
                completed_clips: 0,
                clips: Vec::new(),
                final_video: None,
                error: None,
            },
        }
    }

    #[tokio::test]
    async fn test_publish_and_receive_in_order() {
        let publisher = ProgressPublisher::default();
        let id = Uuid::new_v4();
        let mut rx = publisher.subscribe(id);

        publisher.publish(event(id, ProjectStatus::Generating, 1));
        publisher.publish(event(id, ProjectStatus::Compiling, 2));

        assert_eq!(rx.recv().await.unwrap().snapshot().revision, 1);
        assert_eq!(rx.recv().await.unwrap().snapshot().revision, 2);
    }

    #[tokio::test]
    async fn test_projects_are_isolated() {
        let publisher = ProgressPublisher::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut rx_a = publisher.subscribe(a);

        publisher.publish(event(b, ProjectStatus::Generating, 1));
        publisher.publish(event(a, ProjectStatus::Generating, 5));

        assert_eq!(rx_a.recv().await.unwrap().project_id(), a);
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        let publisher = ProgressPublisher::default();
        publisher.publish(event(Uuid::new_v4(), ProjectStatus::Generating, 1));
        assert_eq!(publisher.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_terminal_event_closes_channel() {
        let publisher = ProgressPublisher::default();
        let id = Uuid::new_v4();
        let mut rx = publisher.subscribe(id);

        publisher.publish(event(id, ProjectStatus::Completed, 9));
        assert_eq!(publisher.channel_count(), 0);

        assert_eq!(rx.recv().await.unwrap().snapshot().revision, 9);
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    }

    #[test]
    fn test_abandoned_channels_are_dropped() {
        let publisher = ProgressPublisher::default();
        let idle = Uuid::new_v4();
        let other = Uuid::new_v4();

        drop(publisher.subscribe(idle));
        assert_eq!(publisher.channel_count(), 1);
        let _rx = publisher.subscribe(other);
        assert_eq!(publisher.channel_count(), 1, "idle channel swept on subscribe");

        drop(publisher.subscribe(idle));
        publisher.publish(event(idle, ProjectStatus::Generating, 1));
        assert_eq!(publisher.channel_count(), 1, "idle channel dropped on publish");

        publisher.publish(event(other, ProjectStatus::Generating, 1));
        assert_eq!(publisher.channel_count(), 1, "live channel kept");
    }

    #[tokio::test]
    async fn test_slow_receiver_lags() {
        let publisher = ProgressPublisher::new(2);
        let id = Uuid::new_v4();
        let mut rx = publisher.subscribe(id);

        for revision in 1..=5 {
            publisher.publish(event(id, ProjectStatus::Generating, revision));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(rx.recv().await.unwrap().snapshot().revision, 4);
    }
}
