//! Errors raised while loading `.clipforge/`.
//!
//! Every variant carries the offending path so the CLI can point at the file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `config.toml` is not valid TOML or has wrongly typed settings.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A project definition is not valid YAML, or names an unknown style.
    #[error("Failed to parse project definition at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Two definitions share a project name.
    #[error("Project '{name}' in {path} is already defined in {first}")]
    DuplicateProject {
        name: String,
        first: PathBuf,
        path: PathBuf,
    },

    /// A setting is present but out of range.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
