//! DigitalOcean provider error types

use boxflow_cloud::{ApiError, CloudError};
use boxflow_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitalOceanError {
    #[error("Please build the box deployment image first using: box mkimage")]
    MissingBaseImage,

    #[error(
        "It appears a DigitalOcean image ({image_id}) was already created.\nPlease use the --overwrite option if you'd like to replace it with a new one."
    )]
    ImageAlreadyBuilt { image_id: u64 },

    #[error("No SSH public key is registered for this project, run `box init` first")]
    MissingPublicKey,

    #[error("Unable to read key file {}: {source}", .path.display())]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to obtain the public IPv4 address of droplet {0}")]
    NoPublicAddress(u64),

    #[error("Droplet {0} reported no snapshot after the snapshot action completed")]
    NoSnapshot(u64),

    #[error(
        "Interrupted. If a box-image-maker droplet is still listed in your DigitalOcean account, delete it manually"
    )]
    Interrupted,

    #[error("Invalid snapshot id \"{0}\"")]
    InvalidSnapshotId(String),

    #[error("Unknown region \"{0}\"")]
    InvalidRegion(String),

    #[error("Unknown droplet size \"{0}\"")]
    InvalidSize(String),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ApiError> for DigitalOceanError {
    fn from(err: ApiError) -> Self {
        DigitalOceanError::Cloud(CloudError::Api(err))
    }
}

impl DigitalOceanError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DigitalOceanError::Cloud(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, DigitalOceanError>;
