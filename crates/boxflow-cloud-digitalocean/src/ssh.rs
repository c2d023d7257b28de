//! `ssh` CLI wrapper
//!
//! Drives the system `ssh` binary for remote command execution. Host keys of
//! freshly created droplets are never known in advance, so host key checking
//! is disabled and nothing is written to `known_hosts`.

use async_trait::async_trait;
use boxflow_cloud::{CloudError, RemoteShell, Result, ShellCredentials, ShellSession, join_commands};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

pub struct SshShell {
    program: String,
    connect_timeout: Duration,
}

impl Default for SshShell {
    fn default() -> Self {
        Self::new()
    }
}

impl SshShell {
    pub fn new() -> Self {
        Self {
            program: "ssh".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// A verified target. Each `run` opens its own connection.
pub struct SshSession {
    program: String,
    args: Vec<String>,
}

fn ssh_args(credentials: &ShellCredentials, host: &str, connect_timeout: Duration) -> Vec<String> {
    vec![
        "-i".to_string(),
        credentials.private_key.display().to_string(),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "-o".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "-o".to_string(),
        format!("ConnectTimeout={}", connect_timeout.as_secs().max(1)),
        "-o".to_string(),
        "LogLevel=ERROR".to_string(),
        format!("{}@{}", credentials.user, host),
    ]
}

/// Run one remote command line, logging its output as it arrives
async fn run_ssh(program: &str, args: &[String], remote: &str) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.arg(remote);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    tracing::debug!("Running: {} {} {}", program, args.join(" "), remote);

    let mut child = cmd.spawn()?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = tokio::spawn(async move {
        let mut lines = Vec::new();
        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                tracing::info!("{}", line);
                lines.push(line);
            }
        }
        lines
    });

    let stderr_task = tokio::spawn(async move {
        let mut lines = Vec::new();
        if let Some(stderr) = stderr {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                lines.push(line);
            }
        }
        lines
    });

    let status = child.wait().await?;
    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(CloudError::CommandFailed(format!(
            "{} (exit status {})",
            stderr.join("\n").trim(),
            status
        )));
    }

    Ok(stdout.join("\n"))
}

#[async_trait]
impl RemoteShell for SshShell {
    type Session = SshSession;

    async fn connect(&self, credentials: &ShellCredentials, host: &str) -> Result<SshSession> {
        let args = ssh_args(credentials, host, self.connect_timeout);
        run_ssh(&self.program, &args, "true").await?;
        Ok(SshSession {
            program: self.program.clone(),
            args,
        })
    }
}

#[async_trait]
impl ShellSession for SshSession {
    async fn run(&self, commands: &[String]) -> Result<String> {
        run_ssh(&self.program, &self.args, &join_commands(commands)).await
    }
}
