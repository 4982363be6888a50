//! Mock generation provider for testing and dry runs.
//!
//! Produces deterministic media references, records every call, and can be
//! scripted to fail for prompts containing a given substring.

use crate::generation::base::{GenerationError, GenerationProvider};
use async_trait::async_trait;
use cf_protocol::MediaRef;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Which provider operation a call or failure rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    Image,
    Video,
    Compile,
}

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: MockOperation,
    /// Prompt for image/video calls; comma-joined clip refs for compile calls.
    pub input: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: MockOperation,
    pattern: String,
    error: GenerationError,
    /// `None` fails forever.
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<FailureRule>,
    calls: Vec<MockCall>,
    images: u32,
    videos: u32,
    compiles: u32,
}

pub struct MockProvider {
    available: bool,
    latency: Option<Duration>,
    state: Mutex<MockState>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// An available provider that always succeeds.
    pub fn new() -> Self {
        Self {
            available: true,
            latency: None,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Sleep this long inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `times` calls of `operation` whose input contains `pattern`.
    pub fn fail_times(
        mut self,
        operation: MockOperation,
        pattern: impl Into<String>,
        error: GenerationError,
        times: u32,
    ) -> Self {
        self.push_rule(operation, pattern.into(), error, Some(times));
        self
    }

    /// Fail every call of `operation` whose input contains `pattern`.
    pub fn fail_always(
        mut self,
        operation: MockOperation,
        pattern: impl Into<String>,
        error: GenerationError,
    ) -> Self {
        self.push_rule(operation, pattern.into(), error, None);
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Calls of one operation, in order.
    pub fn calls_for(&self, operation: MockOperation) -> Vec<MockCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    fn push_rule(
        &mut self,
        operation: MockOperation,
        pattern: String,
        error: GenerationError,
        remaining: Option<u32>,
    ) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.rules.push(FailureRule {
            operation,
            pattern,
            error,
            remaining,
        });
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn call(&self, operation: MockOperation, input: String) -> Result<MediaRef, GenerationError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        let failure = state.rules.iter_mut().find_map(|rule| {
            if rule.operation != operation || !input.contains(&rule.pattern) {
                return None;
            }
            match rule.remaining.as_mut() {
                Some(0) => None,
                Some(remaining) => {
                    *remaining -= 1;
                    Some(rule.error.clone())
                }
                None => Some(rule.error.clone()),
            }
        });

        state.calls.push(MockCall {
            operation,
            input,
            succeeded: failure.is_none(),
        });

        if let Some(error) = failure {
            return Err(error);
        }

        let media = match operation {
            MockOperation::Image => {
                state.images += 1;
                format!("mock://image/{}", state.images)
            }
            MockOperation::Video => {
                state.videos += 1;
                format!("mock://video/{}", state.videos)
            }
            MockOperation::Compile => {
                state.compiles += 1;
                format!("mock://final/{}", state.compiles)
            }
        };
        Ok(MediaRef::new(media))
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn check_availability(&self) -> bool {
        self.available
    }

    async fn generate_image(&self, prompt: &str) -> Result<MediaRef, GenerationError> {
        self.call(MockOperation::Image, prompt.to_string()).await
    }

    async fn generate_video(
        &self,
        prompt: &str,
        _image: &MediaRef,
    ) -> Result<MediaRef, GenerationError> {
        self.call(MockOperation::Video, prompt.to_string()).await
    }

    async fn compile_video(&self, clips: &[MediaRef]) -> Result<MediaRef, GenerationError> {
        let input = clips
            .iter()
            .map(MediaRef::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.call(MockOperation::Compile, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_success() {
        let provider = MockProvider::new();
        assert!(provider.check_availability().await);

        let image = provider.generate_image("kitchen").await.unwrap();
        let video = provider.generate_video("pan", &image).await.unwrap();
        let final_cut = provider.compile_video(&[video.clone()]).await.unwrap();

        assert_eq!(image.as_str(), "mock://image/1");
        assert_eq!(video.as_str(), "mock://video/1");
        assert_eq!(final_cut.as_str(), "mock://final/1");
        assert_eq!(provider.calls().len(), 3);
        assert_eq!(provider.calls_for(MockOperation::Compile)[0].input, "mock://video/1");
    }

    #[tokio::test]
    async fn test_mock_provider_unavailable() {
        assert!(!MockProvider::unavailable().check_availability().await);
    }

    #[tokio::test]
    async fn test_mock_provider_fail_times() {
        let provider = MockProvider::new().fail_times(
            MockOperation::Image,
            "street",
            GenerationError::Timeout("slow".to_string()),
            2,
        );

        assert!(provider.generate_image("a street").await.is_err());
        assert!(provider.generate_image("a kitchen").await.is_ok());
        assert!(provider.generate_image("busy street").await.is_err());
        assert!(provider.generate_image("street again").await.is_ok());

        let outcomes: Vec<bool> = provider.calls().iter().map(|c| c.succeeded).collect();
        assert_eq!(outcomes, vec![false, true, false, true]);
    }

    #[tokio::test]
    async fn test_mock_provider_fail_always() {
        let provider = MockProvider::new().fail_always(
            MockOperation::Video,
            "",
            GenerationError::Rejected("policy".to_string()),
        );
        let image = provider.generate_image("x").await.unwrap();
        for _ in 0..3 {
            let err = provider.generate_video("y", &image).await.unwrap_err();
            assert_eq!(err, GenerationError::Rejected("policy".to_string()));
        }
    }
}
