use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Unable to connect to Docker: {0}\n\nHint:\n  • Make sure the Docker daemon is running\n  • Check that `docker ps` works for the current user"
    )]
    DockerConnectionFailed(String),

    #[error("Docker API error: {0}")]
    DockerApiError(String),

    #[error("Error pulling image {image}: {message}")]
    PullFailed { image: String, message: String },

    #[error("Pulling image {image} did not finish within {seconds}s")]
    PullTimeout { image: String, seconds: u64 },

    #[error(
        "The project \"{running}\" is still running, please stop it before running another project.\n\nHint:\n  • box shutdown"
    )]
    ProjectConflict { running: String },

    #[error("An error occurred while creating the container for service '{service}': {message}")]
    CreateFailed { service: String, message: String },

    #[error("An error occurred while starting service '{service}': {message}")]
    StartFailed { service: String, message: String },

    #[error(transparent)]
    Core(#[from] boxflow_core::CoreError),

    #[error(transparent)]
    Config(#[from] boxflow_config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        let err_str = err.to_string();
        match &err {
            bollard::errors::Error::DockerResponseServerError { .. } => {
                ContainerError::DockerApiError(err_str)
            }
            _ if err_str.contains("Connection refused")
                || err_str.contains("No such file or directory") =>
            {
                ContainerError::DockerConnectionFailed(err_str)
            }
            _ => ContainerError::DockerApiError(err_str),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
