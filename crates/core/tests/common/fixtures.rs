//! Test fixtures for projects, configs and managers.

use cf_core::PipelineManager;
use cf_core::generation::GenerationProvider;
use cf_protocol::{ClipSpec, GlobalConfig, NewProject, RetrySettings};
use std::sync::Arc;
use tempfile::TempDir;

/// Global config with 1 ms backoff so retries don't slow the suite down.
#[allow(dead_code)]
pub fn fast_config() -> GlobalConfig {
    GlobalConfig {
        retry: RetrySettings {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 1,
        },
        ..GlobalConfig::default()
    }
}

#[allow(dead_code)]
pub fn clip_spec(image_prompt: &str, video_prompt: &str) -> ClipSpec {
    ClipSpec {
        image_prompt: image_prompt.to_string(),
        video_prompt: video_prompt.to_string(),
        voice_line: None,
    }
}

/// A project whose clip `i` has image prompt `clip-i image` and video
/// prompt `clip-i motion`.
#[allow(dead_code)]
pub fn numbered_project(name: &str, clips: usize) -> NewProject {
    NewProject {
        name: name.to_string(),
        clips: (0..clips)
            .map(|i| clip_spec(&format!("clip-{i} image"), &format!("clip-{i} motion")))
            .collect(),
        style: None,
    }
}

#[allow(dead_code)]
pub fn in_memory_manager(provider: Arc<dyn GenerationProvider>) -> PipelineManager {
    PipelineManager::in_memory(provider, &fast_config())
}

/// Temporary root with a `.clipforge/config.toml` that enables the JSON store.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_store_root() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let cf_dir = temp_dir.path().join(".clipforge");
    std::fs::create_dir_all(&cf_dir)?;
    std::fs::write(
        cf_dir.join("config.toml"),
        r#"
[retry]
max_attempts = 3
base_delay_ms = 1
max_delay_ms = 1

[store]
dir = ".clipforge/store"
"#,
    )?;
    Ok(temp_dir)
}
