mod commands;
mod utils;

use boxflow_cloud::Settings;
use boxflow_cloud_digitalocean::catalog::{DEFAULT_REGION, DEFAULT_SIZE};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "box")]
#[command(version)]
#[command(
    about = "Provision a DigitalOcean host and run a dependency-ordered Docker stack",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Timing knobs for remote operations
#[derive(Args, Debug, Clone)]
struct SettingsArgs {
    /// Seconds between status checks of remote operations
    #[arg(long, global = true, env = "BOX_POLL_INTERVAL", default_value_t = 5)]
    poll_interval: u64,
    /// Seconds to wait for a remote operation before giving up
    #[arg(long, global = true, env = "BOX_POLL_TIMEOUT", default_value_t = 600)]
    poll_timeout: u64,
    /// SSH connection attempts during image builds
    #[arg(long, global = true, env = "BOX_CONNECT_ATTEMPTS", default_value_t = 10)]
    connect_attempts: u32,
    /// Seconds between SSH connection attempts
    #[arg(long, global = true, env = "BOX_CONNECT_RETRY_DELAY", default_value_t = 10)]
    connect_retry_delay: u64,
    /// Seconds allowed for a single image pull (unbounded when omitted)
    #[arg(long, global = true, env = "BOX_PULL_TIMEOUT")]
    pull_timeout: Option<u64>,
}

impl From<&SettingsArgs> for Settings {
    fn from(args: &SettingsArgs) -> Self {
        Settings {
            poll_interval: Duration::from_secs(args.poll_interval),
            poll_timeout: Duration::from_secs(args.poll_timeout),
            connect_attempts: args.connect_attempts,
            connect_retry_delay: Duration::from_secs(args.connect_retry_delay),
            pull_timeout: args.pull_timeout.map(Duration::from_secs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project
    Init {
        /// Project name
        name: String,
        /// Bare domain served by the remote host, e.g. example.com
        #[arg(long)]
        domain: String,
        /// Registration email
        #[arg(long)]
        email: String,
        /// DigitalOcean region slug
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
        /// Droplet size slug
        #[arg(long, default_value = DEFAULT_SIZE)]
        size: String,
        /// Block storage volume size in GiB
        #[arg(long, default_value_t = 1)]
        volume_size: u32,
        /// SSH private key; `<key>.pub` is registered with DigitalOcean
        #[arg(long)]
        private_key: Option<PathBuf>,
        /// DigitalOcean API token
        #[arg(long, env = "DIGITALOCEAN_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Make the DigitalOcean base image
    Mkimage {
        /// Project name
        name: String,
        /// Replace an existing image
        #[arg(long)]
        overwrite: bool,
    },
    /// Provision the remote host and its resources
    Mkremote {
        /// Project name
        name: String,
    },
    /// Run the project in development mode
    Dev,
    /// Run the project
    Up {
        /// Use the production core services and data directory
        #[arg(long)]
        production: bool,
    },
    /// Shut down the current project
    Shutdown,
    /// Build the project's local images
    Build,
}

async fn run(command: Commands, settings: Settings) -> anyhow::Result<()> {
    match command {
        Commands::Init {
            name,
            domain,
            email,
            region,
            size,
            volume_size,
            private_key,
            token,
        } => {
            commands::init::handle(
                commands::init::InitArgs {
                    name,
                    domain,
                    email,
                    region,
                    size,
                    volume_size,
                    private_key,
                    token,
                },
                &settings,
            )
            .await
        }
        Commands::Mkimage { name, overwrite } => {
            commands::mkimage::handle(&name, overwrite, &settings).await
        }
        Commands::Mkremote { name } => commands::mkremote::handle(&name, &settings).await,
        Commands::Dev => commands::up::handle(false, &settings).await,
        Commands::Up { production } => commands::up::handle(production, &settings).await,
        Commands::Shutdown => commands::shutdown::handle().await,
        Commands::Build => commands::build::handle().await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::from(&cli.settings);

    // mkimage handles Ctrl-C itself to clean up its temporary droplet
    if let Commands::Mkimage { name, overwrite } = &cli.command {
        return commands::mkimage::handle(name, *overwrite, &settings).await;
    }

    // Dropping the pipeline future abandons in-flight remote work; the
    // checkpoint already holds every identifier created so far.
    tokio::select! {
        result = run(cli.command, settings) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("{}", "Interrupted".yellow());
            std::process::exit(130);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let cli = Cli::try_parse_from(["box", "dev"]).unwrap();
        assert_eq!(Settings::from(&cli.settings), Settings::default());
    }

    #[test]
    fn test_settings_flags() {
        let cli = Cli::try_parse_from([
            "box",
            "mkremote",
            "shop",
            "--poll-timeout",
            "30",
            "--pull-timeout",
            "120",
        ])
        .unwrap();
        let settings = Settings::from(&cli.settings);
        assert_eq!(settings.poll_timeout, Duration::from_secs(30));
        assert_eq!(settings.pull_timeout, Some(Duration::from_secs(120)));
        assert!(matches!(cli.command, Commands::Mkremote { ref name } if name == "shop"));
    }

    #[test]
    fn test_up_production_flag() {
        let cli = Cli::try_parse_from(["box", "up", "--production"]).unwrap();
        assert!(matches!(cli.command, Commands::Up { production: true }));
    }
}
