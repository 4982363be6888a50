//! Provider builders for integration tests.

use cf_core::generation::adapters::MockOperation;
use cf_core::generation::{GenerationError, MockProvider};
use std::sync::Arc;
use std::time::Duration;

/// Every image call for clip `index` times out.
#[allow(dead_code)]
pub fn image_always_times_out(index: usize) -> Arc<MockProvider> {
    Arc::new(MockProvider::new().fail_always(
        MockOperation::Image,
        format!("clip-{index} "),
        GenerationError::Timeout("generation timed out".to_string()),
    ))
}

/// Slow enough for a test to act while the run is in flight.
#[allow(dead_code)]
pub fn slow_provider() -> Arc<MockProvider> {
    Arc::new(MockProvider::new().with_latency(Duration::from_millis(50)))
}
