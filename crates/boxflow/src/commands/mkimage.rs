use crate::utils;
use boxflow_cloud::Settings;
use boxflow_cloud_digitalocean::{DigitalOceanClient, ImageBuilder, ImageOutcome, SshShell};
use boxflow_config::ProjectStore;
use colored::Colorize;

pub async fn handle(name: &str, overwrite: bool, settings: &Settings) -> anyhow::Result<()> {
    let store = ProjectStore::from_env()?;
    let mut config = store.load(name)?;

    println!("{}", "Building the box base image...".blue());
    let client = DigitalOceanClient::new(config.api_token.clone());
    let builder = ImageBuilder::new(client, SshShell::new(), store, settings.clone());

    // The builder owns Ctrl-C here so it can delete its temporary droplet
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match builder.build_until(&mut config, overwrite, interrupt).await? {
        ImageOutcome::Existing(id) => {
            utils::print_done(&format!("Using the existing base image ({})", id))
        }
        ImageOutcome::Built(id) => utils::print_done(&format!("Base image built ({})", id)),
    }
    println!("Next: {}", format!("box mkremote {}", name).cyan());
    Ok(())
}
