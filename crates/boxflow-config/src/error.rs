use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to determine the user's home directory")]
    ConfigDirNotFound,

    #[error("Unable to read file at {}, are you sure the project \"{project}\" exists?", .path.display())]
    ProjectNotFound { project: String, path: PathBuf },

    #[error("A project already exists by the name: {0}")]
    ProjectExists(String),

    #[error("Unable to process YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Core(#[from] boxflow_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
