use crate::utils;
use boxflow_config::RunLockFile;
use boxflow_container::{ContainerLifecycleManager, DockerRuntime, LifecycleOptions};
use colored::Colorize;

/// Stops whatever managed stack is running, regardless of the working directory
pub async fn handle() -> anyhow::Result<()> {
    let lock_file = RunLockFile::from_env()?;
    let project = lock_file
        .read()?
        .map(|record| record.project)
        .unwrap_or_else(|| "unknown".to_string());

    println!("{}", "Connecting to Docker...".blue());
    let runtime = DockerRuntime::connect().await?;

    println!("Shutting down {}", project.cyan());
    let options = LifecycleOptions {
        project_hash: boxflow_core::project_hash(&project),
        project,
        data_dir: Default::default(),
        production: false,
        pull_timeout: None,
    };
    let mut manager = ContainerLifecycleManager::new(runtime, lock_file, options);
    manager.shutdown().await?;

    utils::print_done("Shutdown complete");
    Ok(())
}
