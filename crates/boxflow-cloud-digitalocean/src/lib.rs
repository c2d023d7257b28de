//! DigitalOcean provider for boxflow
//!
//! REST client, typed resources, the remote environment provisioner and the
//! base image builder. Remote commands go through the system `ssh` binary.
//!
//! ```no_run
//! use boxflow_cloud::Settings;
//! use boxflow_cloud_digitalocean::{DigitalOceanClient, RemoteProvisioner};
//! use boxflow_config::ProjectStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ProjectStore::from_env()?;
//! let mut config = store.load("shop")?;
//! let client = DigitalOceanClient::new(config.api_token.clone());
//! let provisioner = RemoteProvisioner::new(client, store, Settings::default());
//! provisioner.provision(&mut config).await?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod error;
pub mod image;
pub mod provisioner;
pub mod resources;
pub mod ssh;

#[cfg(test)]
mod testing;

// Re-exports
pub use client::{DIGITALOCEAN_API_BASE, DigitalOceanClient, TOKEN_ENV};
pub use error::{DigitalOceanError, Result};
pub use image::{ImageBuilder, ImageOutcome};
pub use provisioner::{DnsOutcome, Outcome, ProvisionReport, RemoteProvisioner, ensure_public_key};
pub use ssh::SshShell;
