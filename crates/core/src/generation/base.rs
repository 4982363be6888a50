//! Base GenerationProvider trait and supporting types.

use async_trait::async_trait;
use cf_protocol::MediaRef;
use thiserror::Error;

/// Errors reported by a generation provider.
///
/// The first three are transient and retried; the rest fail the stage
/// immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationError::Timeout(_)
                | GenerationError::RateLimited(_)
                | GenerationError::Unavailable(_)
        )
    }
}

/// The external image/video generation capability.
///
/// Implementations wrap a concrete provider API. The pipeline only ever
/// passes [`MediaRef`]s between calls and never inspects them.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn check_availability(&self) -> bool;

    async fn generate_image(&self, prompt: &str) -> Result<MediaRef, GenerationError>;

    async fn generate_video(
        &self,
        prompt: &str,
        image: &MediaRef,
    ) -> Result<MediaRef, GenerationError>;

    /// Assemble clip videos, given in timeline order, into one video.
    async fn compile_video(&self, clips: &[MediaRef]) -> Result<MediaRef, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestProvider {
        available: bool,
    }

    #[async_trait]
    impl GenerationProvider for TestProvider {
        async fn check_availability(&self) -> bool {
            self.available
        }

        async fn generate_image(&self, prompt: &str) -> Result<MediaRef, GenerationError> {
            if prompt.contains("forbidden") {
                return Err(GenerationError::Rejected("content policy".to_string()));
            }
            Ok(MediaRef::new(format!("img:{prompt}")))
        }

        async fn generate_video(
            &self,
            prompt: &str,
            image: &MediaRef,
        ) -> Result<MediaRef, GenerationError> {
            Ok(MediaRef::new(format!("vid:{prompt}:{image}")))
        }

        async fn compile_video(&self, clips: &[MediaRef]) -> Result<MediaRef, GenerationError> {
            Ok(MediaRef::new(format!("final:{}", clips.len())))
        }
    }

    #[tokio::test]
    async fn test_provider_check_availability() {
        assert!(TestProvider { available: true }.check_availability().await);
        assert!(!TestProvider { available: false }.check_availability().await);
    }

    #[tokio::test]
    async fn test_provider_chain() {
        let provider = TestProvider { available: true };
        let image = provider.generate_image("a kitchen").await.unwrap();
        let video = provider.generate_video("pan", &image).await.unwrap();
        assert_eq!(video.as_str(), "vid:pan:img:a kitchen");

        let err = provider.generate_image("forbidden").await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(GenerationError::Timeout("t".into()).is_transient());
        assert!(GenerationError::RateLimited("r".into()).is_transient());
        assert!(GenerationError::Unavailable("u".into()).is_transient());
        assert!(!GenerationError::Rejected("x".into()).is_transient());
        assert!(!GenerationError::InvalidRequest("x".into()).is_transient());
    }
}
