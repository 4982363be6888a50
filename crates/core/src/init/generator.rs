//! Directory structure and file generation for `.clipforge` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::loader::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a .clipforge directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where .clipforge will be created.
    pub target_dir: PathBuf,

    /// Overwrite an existing .clipforge directory.
    pub force: bool,

    /// Create only the config and one explicit-clip project.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate a `.clipforge` directory structure with templates.
///
/// ```text
/// .clipforge/
/// ├── config.toml
/// └── projects/
///     ├── example.yaml
///     └── prehook.yaml (unless minimal)
/// ```
///
/// # Returns
/// The paths written, relative to `.clipforge/`.
///
/// # Errors
/// - The .clipforge directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_clipforge_structure(options: InitOptions) -> InitResult<Vec<String>> {
    let cf_dir = options.target_dir.join(CONFIG_DIR);

    if cf_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(cf_dir));
    }

    let projects_dir = cf_dir.join("projects");
    fs::create_dir_all(&projects_dir).map_err(|source| InitError::DirectoryCreate {
        path: projects_dir.clone(),
        source,
    })?;

    let mut written = vec!["config.toml".to_string()];
    if options.minimal {
        written.push("projects/example.yaml".to_string());
    } else {
        written.extend(list_templates("projects/"));
    }

    for template_path in &written {
        write_template_file(&cf_dir, template_path)?;
    }

    Ok(written)
}

/// Write one embedded template below `cf_dir`, creating parents as needed.
fn write_template_file(cf_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = cf_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_generate_structure_success() {
        let dir = tempdir().unwrap();
        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
            minimal: false,
        };

        let written = generate_clipforge_structure(options).await.unwrap();
        assert_eq!(written.len(), 3);

        let cf_dir = dir.path().join(".clipforge");
        assert!(cf_dir.join("config.toml").exists(), "config.toml should exist");
        assert!(cf_dir.join("projects/example.yaml").exists());
        assert!(cf_dir.join("projects/prehook.yaml").exists());

        let config = load_config(dir.path()).await.unwrap();
        assert_eq!(config.projects.len(), 2);
        assert!(config.project("prehook").is_some());
    }

    #[tokio::test]
    async fn test_generate_structure_minimal() {
        let dir = tempdir().unwrap();
        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
            minimal: true,
        };

        generate_clipforge_structure(options).await.unwrap();

        let cf_dir = dir.path().join(".clipforge");
        assert!(cf_dir.join("projects/example.yaml").exists());
        assert!(
            !cf_dir.join("projects/prehook.yaml").exists(),
            "prehook.yaml should not exist in minimal mode"
        );
    }

    #[tokio::test]
    async fn test_generate_structure_exists_without_force() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".clipforge")).unwrap();

        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
            minimal: false,
        };

        let result = generate_clipforge_structure(options).await;
        assert!(matches!(result, Err(InitError::DirectoryExists(_))));
    }

    #[tokio::test]
    async fn test_generate_structure_exists_with_force() {
        let dir = tempdir().unwrap();
        let cf_dir = dir.path().join(".clipforge");
        fs::create_dir_all(&cf_dir).unwrap();
        fs::write(cf_dir.join("config.toml"), "[retry]\nmax_attempts = 9\n").unwrap();

        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: true,
            minimal: false,
        };

        generate_clipforge_structure(options).await.unwrap();
        let config = fs::read_to_string(cf_dir.join("config.toml")).unwrap();
        assert!(config.contains("max_attempts = 3"), "config.toml should be overwritten");
    }

    #[test]
    fn test_default_init_options() {
        let options = InitOptions::default();
        assert!(!options.force);
        assert!(!options.minimal);
    }
}
