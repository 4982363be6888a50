//! Progress fan-out to observers.
//!
//! The run task publishes an event after every committed transition; each
//! observer receives an ordered stream of project snapshots.

pub mod publisher;
pub mod subscription;

pub use publisher::ProgressPublisher;
pub use subscription::{snapshot_stream, SnapshotStream};
