use crate::utils;
use boxflow_cloud::Settings;
use boxflow_config::{ProjectStore, RunLockFile};
use boxflow_container::{
    ContainerLifecycleManager, DockerRuntime, LifecycleOptions, PRODUCTION_DATA_DIR,
};
use boxflow_core::project_hash;
use colored::Colorize;
use std::path::PathBuf;

/// `box dev` and `box up`
pub async fn handle(production: bool, settings: &Settings) -> anyhow::Result<()> {
    let manifest = utils::load_manifest()?;

    let data_dir = if production {
        PathBuf::from(PRODUCTION_DATA_DIR)
    } else {
        // The project has to be initialized before it can run locally
        let store = ProjectStore::from_env()?;
        store.load(&manifest.project)?;
        store.data_dir(&manifest.project)
    };

    println!("{}", "Connecting to Docker...".blue());
    let runtime = DockerRuntime::connect().await?;

    let options = LifecycleOptions {
        project: manifest.project.clone(),
        project_hash: project_hash(&manifest.project),
        data_dir,
        production,
        pull_timeout: settings.pull_timeout,
    };
    let mut manager = ContainerLifecycleManager::new(runtime, RunLockFile::from_env()?, options);

    let mode = if production { "production" } else { "development" };
    println!("Starting {} in {} mode", manifest.project.cyan(), mode);
    manager.start(&manifest).await?;

    utils::print_done(&format!(
        "{} containers running",
        manager.handles().len()
    ));
    println!("Stop with: {}", "box shutdown".cyan());
    Ok(())
}
