//! Configuration file loader for the `.clipforge/` directory structure.
//!
//! This module loads and parses all configuration files from `.clipforge/`:
//! - `config.toml`: Global settings
//! - `projects/*.yaml`: Project definitions

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use cf_protocol::config_models::{GlobalConfig, ProjectDefinition};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the configuration directory under a project root.
pub const CONFIG_DIR: &str = ".clipforge";

/// Loads all configuration from the `.clipforge/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.clipforge/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or files
/// are missing (but the root exists), returns a default configuration rather
/// than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid TOML or YAML syntax
/// - Settings are out of range, or two projects share a name
///
/// # Example
///
/// ```rust,no_run
/// use cf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} projects", config.projects.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let cf_dir = root.join(CONFIG_DIR);

    if !cf_dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&cf_dir)?;
    let projects = load_projects(&cf_dir)?;

    Ok(AppConfig { global, projects })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(cf_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = cf_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "retry.max_attempts must be at least 1".to_string(),
        });
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                retry.base_delay_ms, retry.max_delay_ms
            ),
        });
    }
    if config.progress.channel_capacity == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "progress.channel_capacity must be at least 1".to_string(),
        });
    }

    Ok(config)
}

/// Loads all project definitions from `projects/*.yaml` and `projects/*.yml`.
fn load_projects(cf_dir: &Path) -> ConfigResult<Vec<ProjectDefinition>> {
    let projects_dir = cf_dir.join("projects");

    if !projects_dir.exists() {
        return Ok(Vec::new());
    }

    let mut projects = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(&projects_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: projects_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let project: ProjectDefinition =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        if project.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "project name must not be empty".to_string(),
            });
        }
        if let Some(first) = seen.get(&project.name) {
            return Err(ConfigError::DuplicateProject {
                name: project.name,
                first: first.clone(),
                path: path.to_path_buf(),
            });
        }
        seen.insert(project.name.clone(), path.to_path_buf());

        projects.push(project);
    }

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_protocol::ScriptStyle;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_config_acceptance() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let cf_dir = root.join(CONFIG_DIR);

        fs::create_dir_all(cf_dir.join("projects")).expect("Failed to create projects dir");

        let config_toml = r#"
[retry]
max_attempts = 5
base_delay_ms = 100

[store]
dir = ".clipforge/store"
"#;
        fs::write(cf_dir.join("config.toml"), config_toml).expect("Failed to write config.toml");

        let scripted = r#"name: joint-relief
script:
  style: transformation
  product:
    name: FlexiJoint
    target_audience: "women experiencing joint pain, low energy"
  avatar-description: "a warm woman in her fifties"
"#;
        fs::write(cf_dir.join("projects/b-joint.yaml"), scripted)
            .expect("Failed to write project file");

        let explicit = r#"name: kitchen
clips:
  - image_prompt: "A bottle on a kitchen counter"
    video_prompt: "Slow push-in"
  - video_prompt: "Hand picks up the bottle"
"#;
        fs::write(cf_dir.join("projects/a-kitchen.yml"), explicit)
            .expect("Failed to write project file");
        fs::write(cf_dir.join("projects/notes.txt"), "ignored").expect("Failed to write notes");

        let config = load_config(root).await.expect("Failed to load config");

        assert_eq!(config.global.retry.max_attempts, 5);
        assert_eq!(config.global.retry.base_delay_ms, 100);
        assert_eq!(config.global.retry.max_delay_ms, 8_000);
        assert_eq!(config.global.progress.channel_capacity, 64);
        assert_eq!(config.global.store.dir.as_deref(), Some(".clipforge/store"));

        assert_eq!(config.projects.len(), 2, "Should load 2 projects in file order");
        assert_eq!(config.projects[0].name, "kitchen");
        assert_eq!(config.projects[0].clips.len(), 2);
        assert_eq!(config.projects[0].clips[1].image_prompt, "");

        let joint = config.project("joint-relief").expect("joint-relief loaded");
        let script = joint.script.as_ref().expect("script section");
        assert_eq!(script.style, ScriptStyle::Transformation);
        assert_eq!(script.product.name, "FlexiJoint");
        assert_eq!(script.avatar_description, "a warm woman in her fifties");
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path())
            .await
            .expect("Should handle missing .clipforge");

        assert_eq!(config.global, GlobalConfig::default());
        assert!(config.projects.is_empty(), "Should have no projects");
    }

    #[tokio::test]
    async fn test_load_config_partial() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cf_dir).expect("Failed to create .clipforge");
        fs::write(cf_dir.join("config.toml"), "[progress]\nchannel_capacity = 8\n")
            .expect("Failed to write config.toml");

        let config = load_config(dir.path())
            .await
            .expect("Should handle partial config");

        assert_eq!(config.global.progress.channel_capacity, 8);
        assert_eq!(config.global.retry.max_attempts, 3);
        assert!(config.projects.is_empty());
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cf_dir).expect("Failed to create .clipforge");
        fs::write(cf_dir.join("config.toml"), "[retry\nmax_attempts = ")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;
        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_attempts() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cf_dir).expect("Failed to create .clipforge");
        fs::write(cf_dir.join("config.toml"), "[retry]\nmax_attempts = 0\n")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_load_config_invalid_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("projects")).expect("Failed to create projects dir");
        fs::write(cf_dir.join("projects/test.yaml"), "name: test\n  invalid: [yaml")
            .expect("Failed to write project file");

        let result = load_config(dir.path()).await;
        if let Err(ConfigError::YamlParse { path, .. }) = result {
            assert!(path.ends_with("test.yaml"));
        } else {
            panic!("Expected YamlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_unknown_style() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("projects")).expect("Failed to create projects dir");
        let yaml = "name: vlog\nscript:\n  style: vlog\n  product:\n    name: X\n    target_audience: Y\n";
        fs::write(cf_dir.join("projects/vlog.yaml"), yaml).expect("Failed to write project file");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::YamlParse { .. })));
    }

    #[tokio::test]
    async fn test_load_config_duplicate_project_names() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("projects")).expect("Failed to create projects dir");
        for file in ["one.yaml", "two.yaml"] {
            fs::write(cf_dir.join("projects").join(file), "name: same\n")
                .expect("Failed to write project file");
        }

        let result = load_config(dir.path()).await;
        if let Err(ConfigError::DuplicateProject { name, first, path }) = result {
            assert_eq!(name, "same");
            assert!(first.ends_with("one.yaml"));
            assert!(path.ends_with("two.yaml"));
        } else {
            panic!("Expected DuplicateProject error");
        }
    }
}
