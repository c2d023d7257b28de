use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unable to locate manifest at {0}")]
    ManifestNotFound(PathBuf),

    #[error("Unable to process YAML in {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    #[error("File read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service: {service}\n{message}")]
    InvalidService { service: String, message: String },

    #[error("Invalid project name \"{0}\": use 3-20 lowercase letters, digits or hyphens, starting with a letter and not ending with a hyphen")]
    InvalidProjectName(String),

    #[error("Invalid email address \"{0}\"")]
    InvalidEmail(String),

    #[error("Invalid domain \"{0}\": provide the bare domain, e.g. example.com")]
    InvalidDomain(String),

    #[error("Service name '{0}' is reserved for a core service")]
    ReservedServiceName(String),

    #[error("Service '{0}' is defined more than once")]
    DuplicateService(String),

    #[error("Service '{service}' depends on unknown service '{dependency}'")]
    UnresolvedDependency { service: String, dependency: String },

    #[error("Impossible depends_on tree in services: {}", .remaining.join(", "))]
    ImpossibleDependencyTree { remaining: Vec<String> },
}

pub type Result<T> = std::result::Result<T, CoreError>;
