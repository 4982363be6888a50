//! Configuration models that aggregate all settings.

use cf_protocol::config_models::{GlobalConfig, ProjectDefinition};

/// Unified application configuration loaded from `.clipforge/`.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Global settings
/// - `projects/*.yaml`: Project definitions
///
/// # Example
///
/// ```rust,no_run
/// use cf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!(
///     "Loaded {} projects, {} attempts per stage",
///     config.projects.len(),
///     config.global.retry.max_attempts
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// Project definitions from `projects/*.yaml`, sorted by file name.
    pub projects: Vec<ProjectDefinition>,
}

impl AppConfig {
    /// Find a project definition by name.
    pub fn project(&self, name: &str) -> Option<&ProjectDefinition> {
        self.projects.iter().find(|project| project.name == name)
    }
}
