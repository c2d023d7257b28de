//! Remote command execution

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCredentials {
    pub user: String,
    pub private_key: PathBuf,
}

impl ShellCredentials {
    pub fn root(private_key: impl Into<PathBuf>) -> Self {
        Self {
            user: "root".to_string(),
            private_key: private_key.into(),
        }
    }
}

/// An established channel to a remote host
#[async_trait]
pub trait ShellSession: Send + Sync {
    /// Run the commands as one `&&` chain; the first failing command aborts the rest.
    async fn run(&self, commands: &[String]) -> Result<String>;
}

#[async_trait]
pub trait RemoteShell: Send + Sync {
    type Session: ShellSession;

    async fn connect(&self, credentials: &ShellCredentials, host: &str) -> Result<Self::Session>;
}

/// Join commands into a single shell line
pub fn join_commands(commands: &[String]) -> String {
    commands.join(" && ")
}

/// Connect, retrying up to `attempts` times with `delay` between tries.
pub async fn connect_with_retry<S>(
    shell: &S,
    credentials: &ShellCredentials,
    host: &str,
    attempts: u32,
    delay: Duration,
) -> Result<S::Session>
where
    S: RemoteShell + ?Sized,
{
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        tracing::info!("Connecting to {} ({}/{})", host, attempt, attempts);
        match shell.connect(credentials, host).await {
            Ok(session) => return Ok(session),
            Err(e) => {
                tracing::debug!("Connection attempt {} failed: {}", attempt, e);
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(CloudError::ConnectFailed {
        host: host.to_string(),
        attempts,
        message: last_error,
    })
}
