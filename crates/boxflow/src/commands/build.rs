use crate::utils;
use boxflow_core::{ServiceSpec, project_hash};
use colored::Colorize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Working directory and `docker` arguments for one service build
fn docker_build(service: &ServiceSpec, project_hash: &str) -> Option<(PathBuf, Vec<String>)> {
    let build = service.build.as_ref()?;
    let dockerfile = build.context.join(&build.dockerfile);
    let args = vec![
        "build".to_string(),
        "--file".to_string(),
        dockerfile.display().to_string(),
        "--tag".to_string(),
        service.resolved_image(project_hash),
        ".".to_string(),
    ];
    Some((build.context.clone(), args))
}

/// Build every service with a `build` section; the first failure aborts
pub async fn handle() -> anyhow::Result<()> {
    let manifest = utils::load_manifest()?;
    let hash = project_hash(&manifest.project);

    let mut built = 0;
    for service in manifest.buildable_services() {
        let Some((context, args)) = docker_build(service, &hash) else {
            continue;
        };

        println!();
        println!("{}", format!("Building image for {}", service.name).yellow().bold());
        tracing::debug!("Running: docker {} (in {})", args.join(" "), context.display());

        let status = Command::new("docker")
            .args(&args)
            .current_dir(&context)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| anyhow::anyhow!("Unable to run docker: {}", e))?;

        if !status.success() {
            anyhow::bail!("Error building {}: docker build exited with {}", service.name, status);
        }
        built += 1;
    }

    println!();
    utils::print_done(&format!("Build complete ({} images)", built));
    Ok(())
}
