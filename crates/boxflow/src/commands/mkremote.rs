use crate::utils;
use boxflow_cloud::Settings;
use boxflow_cloud_digitalocean::{
    DigitalOceanClient, DnsOutcome, Outcome, ProvisionReport, RemoteProvisioner,
};
use boxflow_config::ProjectStore;
use colored::Colorize;

fn describe(outcome: Outcome) -> colored::ColoredString {
    match outcome {
        Outcome::Verified => "verified".normal(),
        Outcome::Created => "created".green(),
    }
}

fn print_report(report: &ProvisionReport) {
    println!("  domain entry:  {}", describe(report.domain));
    println!("  firewall:      {}", describe(report.firewall));
    println!("  volume:        {}", describe(report.volume));
    println!("  droplet:       {}", describe(report.droplet));
    println!("  attachment:    {}", describe(report.attachment));
    let dns = match report.dns {
        DnsOutcome::Unchanged => "unchanged".normal(),
        DnsOutcome::Created => "created".green(),
        DnsOutcome::Replaced => "replaced".yellow(),
    };
    println!("  A record:      {}", dns);
}

pub async fn handle(name: &str, settings: &Settings) -> anyhow::Result<()> {
    let store = ProjectStore::from_env()?;
    let mut config = store.load(name)?;

    println!("{}", "Provisioning the remote environment...".blue());
    let client = DigitalOceanClient::new(config.api_token.clone());
    let provisioner = RemoteProvisioner::new(client, store, settings.clone());
    let report = provisioner.provision(&mut config).await?;

    print_report(&report);
    utils::print_done(&format!(
        "{} is served from {}",
        config.bare_domain,
        config.droplet_public_ip.as_deref().unwrap_or("-")
    ));
    Ok(())
}
