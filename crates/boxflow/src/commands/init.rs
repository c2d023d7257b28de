use crate::utils;
use boxflow_cloud::Settings;
use boxflow_cloud_digitalocean::{DigitalOceanClient, catalog, ensure_public_key};
use boxflow_config::{ConfigError, ProjectConfig, ProjectStore};
use boxflow_core::{validate_bare_domain, validate_email, validate_project_name};
use colored::Colorize;
use std::path::PathBuf;

pub struct InitArgs {
    pub name: String,
    pub domain: String,
    pub email: String,
    pub region: String,
    pub size: String,
    pub volume_size: u32,
    pub private_key: Option<PathBuf>,
    pub token: String,
}

fn default_private_key() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("id_rsa"))
}

/// Validate everything that can be checked locally
fn build_config(args: InitArgs) -> anyhow::Result<ProjectConfig> {
    validate_project_name(&args.name)?;
    validate_email(&args.email)?;
    validate_bare_domain(&args.domain)?;
    let region = catalog::validate_region(&args.region)?;
    let droplet_slug = catalog::validate_size(&args.size)?;
    if args.volume_size == 0 {
        anyhow::bail!("Volume size must be at least 1 GiB");
    }
    if args.token.trim().is_empty() {
        anyhow::bail!("A DigitalOcean API token is required");
    }

    let private_key_path = args
        .private_key
        .or_else(default_private_key)
        .ok_or_else(|| anyhow::anyhow!("Unable to determine the default SSH key path"))?;

    Ok(ProjectConfig {
        email: args.email,
        api_token: args.token.trim().to_string(),
        region,
        droplet_slug,
        volume_size: args.volume_size,
        bare_domain: args.domain,
        private_key_path,
        ..ProjectConfig::new(args.name)
    })
}

pub async fn handle(args: InitArgs, settings: &Settings) -> anyhow::Result<()> {
    let mut config = build_config(args)?;

    let store = ProjectStore::from_env()?;
    if store.exists(&config.project_name) {
        return Err(ConfigError::ProjectExists(config.project_name).into());
    }

    println!(
        "Region: {} ({})",
        config.region.cyan(),
        catalog::region_name(&config.region).unwrap_or("unknown")
    );
    println!("{}", "Checking for an existing matching SSH public key...".blue());
    let client = DigitalOceanClient::new(config.api_token.clone());
    ensure_public_key(&client, &mut config, settings.deadline()).await?;

    store.create(&config)?;
    utils::print_done(&format!(
        "Project {} created at {}",
        config.project_name,
        store.project_dir(&config.project_name).display()
    ));
    println!("Next: {}", format!("box mkimage {}", config.project_name).cyan());
    Ok(())
}
