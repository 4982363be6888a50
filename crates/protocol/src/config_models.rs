//! Configuration models for `.clipforge/config.toml` and
//! `.clipforge/projects/*.yaml`.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

use crate::project_models::{ClipSpec, NewProject};
use crate::script_models::{Product, ScriptStyle};

/// Represents global settings from `.clipforge/config.toml`.
///
/// Every section and field is optional; missing values take the defaults.
///
/// # Example
///
/// ```toml
/// # .clipforge/config.toml
/// [retry]
/// max_attempts = 3
/// base_delay_ms = 500
/// max_delay_ms = 8000
///
/// [progress]
/// channel_capacity = 64
///
/// [store]
/// dir = ".clipforge/store"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct GlobalConfig {
    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub progress: ProgressSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

/// Retry policy for provider calls.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per stage, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles for each following retry.
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Progress fan-out settings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(default)]
pub struct ProgressSettings {
    /// Per-project broadcast buffer. Slower observers skip ahead.
    pub channel_capacity: usize,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Where project records are kept.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct StoreSettings {
    /// Directory for JSON project records. `None` keeps projects in memory.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Script parameters used to synthesize a project's clips.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ScriptRequest {
    pub style: ScriptStyle,

    pub product: Product,

    #[serde(default)]
    pub avatar_description: String,
}

/// A project defined in `.clipforge/projects/*.yaml`.
///
/// Either lists clips explicitly or carries a `script` section; when both
/// are present the scripted clips come first.
///
/// # Example
///
/// ```yaml
/// name: joint-relief-prehook
/// script:
///   style: transformation
///   product:
///     name: FlexiJoint
///     target_audience: "women aged 45-65 experiencing joint pain, low energy"
///   avatar-description: "a warm woman in her fifties with silver hair"
/// clips:
///   - image_prompt: "Close-up of the FlexiJoint bottle on a kitchen counter"
///     video_prompt: "Slow push-in on the bottle"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectDefinition {
    pub name: String,

    #[serde(default)]
    pub script: Option<ScriptRequest>,

    #[serde(default)]
    pub clips: Vec<ClipSpec>,
}

impl ProjectDefinition {
    /// Build the create-project input, given the clips synthesized from
    /// `script` (empty when there is no script section).
    pub fn into_new_project(self, scripted: Vec<ClipSpec>) -> NewProject {
        let style = self.script.as_ref().map(|script| script.style);
        let mut clips = scripted;
        clips.extend(self.clips);
        NewProject {
            name: self.name,
            clips,
            style,
        }
    }
}
