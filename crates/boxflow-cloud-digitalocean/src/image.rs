//! Base image builds
//!
//! Boots a throwaway droplet from a public Ubuntu image, runs the box
//! configuration script on it over SSH and snapshots the result as
//! `box-base`. Deployment droplets are created from that snapshot.

use crate::catalog::MIN_SIZE;
use crate::error::{DigitalOceanError, Result};
use crate::resources::{CreateDroplet, Droplet, ImageRef, action, droplet, snapshot};
use boxflow_cloud::{
    CloudApi, RemoteShell, Settings, ShellCredentials, ShellSession, connect_with_retry,
    poll_until,
};
use boxflow_config::{ProjectConfig, ProjectStore};
use std::cell::Cell;
use std::future::Future;

pub const IMAGE_MAKER_NAME: &str = "box-image-maker";
pub const BASE_IMAGE_NAME: &str = "box-base";
pub const PUBLIC_IMAGE: &str = "ubuntu-20-04-x64";

const ADMIN_USER: &str = "owner";
const CONFIG_REPO: &str = "box.do-config";
const CONFIG_SCRIPT: &str = "/root/config_image.sh";

/// Commands run on the image maker. The script powers the droplet off when done.
pub fn bootstrap_commands() -> Vec<String> {
    vec![
        format!(
            "wget -O {} https://raw.githubusercontent.com/hashibuto/{}/master/scripts/config_image.sh",
            CONFIG_SCRIPT, CONFIG_REPO
        ),
        format!("chmod +x {}", CONFIG_SCRIPT),
        format!("{} {} {}", CONFIG_SCRIPT, ADMIN_USER, CONFIG_REPO),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// A `box-base` snapshot already existed in the account
    Existing(u64),
    Built(u64),
}

impl ImageOutcome {
    pub fn image_id(&self) -> u64 {
        match self {
            ImageOutcome::Existing(id) | ImageOutcome::Built(id) => *id,
        }
    }
}

pub struct ImageBuilder<A, S> {
    api: A,
    shell: S,
    store: ProjectStore,
    settings: Settings,
}

impl<A: CloudApi, S: RemoteShell> ImageBuilder<A, S> {
    pub fn new(api: A, shell: S, store: ProjectStore, settings: Settings) -> Self {
        Self {
            api,
            shell,
            store,
            settings,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Record the base image id in `config`, building the image when the account has none.
    pub async fn build(&self, config: &mut ProjectConfig, overwrite: bool) -> Result<ImageOutcome> {
        self.build_until(config, overwrite, std::future::pending()).await
    }

    /// [`build`](Self::build), abandoned as soon as `interrupt` completes.
    /// The image maker droplet is deleted on every exit path once it exists.
    pub async fn build_until<F>(
        &self,
        config: &mut ProjectConfig,
        overwrite: bool,
        interrupt: F,
    ) -> Result<ImageOutcome>
    where
        F: Future<Output = ()>,
    {
        let maker = Cell::new(None);
        let result = tokio::select! {
            result = self.run_build(config, overwrite, &maker) => result,
            _ = interrupt => {
                tracing::warn!("Image build interrupted");
                Err(DigitalOceanError::Interrupted)
            }
        };

        if let Some(droplet_id) = maker.get() {
            self.delete_image_maker(droplet_id).await;
        }
        result
    }

    async fn run_build(
        &self,
        config: &mut ProjectConfig,
        overwrite: bool,
        maker: &Cell<Option<u64>>,
    ) -> Result<ImageOutcome> {
        if let Some(image_id) = config.image_id {
            if !overwrite {
                return Err(DigitalOceanError::ImageAlreadyBuilt { image_id });
            }
            self.delete_recorded_image(config, image_id).await?;
        }

        tracing::info!("Checking the DigitalOcean account for an existing image");
        let snapshots = snapshot::list_droplet_snapshots(&self.api, self.settings.deadline()).await?;
        if let Some(existing) = snapshots.iter().find(|s| s.name == BASE_IMAGE_NAME) {
            let image_id: u64 = existing
                .id
                .parse()
                .map_err(|_| DigitalOceanError::InvalidSnapshotId(existing.id.clone()))?;
            tracing::info!("Found {} ({})", BASE_IMAGE_NAME, image_id);
            config.image_id = Some(image_id);
            self.store.save(config)?;
            return Ok(ImageOutcome::Existing(image_id));
        }

        // Fail on local prerequisites before anything is created remotely
        let public_key_id = config
            .public_key_id
            .ok_or(DigitalOceanError::MissingPublicKey)?;
        tokio::fs::metadata(&config.private_key_path)
            .await
            .map_err(|source| DigitalOceanError::KeyUnreadable {
                path: config.private_key_path.clone(),
                source,
            })?;

        tracing::info!("Creating droplet {} for the base image", IMAGE_MAKER_NAME);
        let request = CreateDroplet {
            name: IMAGE_MAKER_NAME.to_string(),
            size: MIN_SIZE.to_string(),
            region: config.region.clone(),
            image: ImageRef::Slug(PUBLIC_IMAGE.to_string()),
            ssh_keys: vec![public_key_id],
            tags: Vec::new(),
        };
        let created = droplet::create(&self.api, &request, self.settings.deadline()).await?;
        maker.set(Some(created.id));

        let image_id = self.configure_and_snapshot(config, created.id).await?;
        Ok(ImageOutcome::Built(image_id))
    }

    async fn delete_recorded_image(&self, config: &mut ProjectConfig, image_id: u64) -> Result<()> {
        tracing::info!("Deleting existing image {}", image_id);
        match snapshot::delete(&self.api, &image_id.to_string(), self.settings.deadline()).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => tracing::info!("Image {} was already gone", image_id),
            Err(e) => return Err(e.into()),
        }
        config.image_id = None;
        self.store.save(config)?;
        Ok(())
    }

    async fn configure_and_snapshot(&self, config: &mut ProjectConfig, droplet_id: u64) -> Result<u64> {
        let running = self
            .wait_for_droplet(droplet_id, "droplet to boot", Droplet::boot_status)
            .await?;
        let address = running
            .public_ipv4()
            .ok_or(DigitalOceanError::NoPublicAddress(droplet_id))?;

        let credentials = ShellCredentials::root(&config.private_key_path);
        let session = connect_with_retry(
            &self.shell,
            &credentials,
            address,
            self.settings.connect_attempts,
            self.settings.connect_retry_delay,
        )
        .await?;
        tracing::info!("SSH connection established, configuring the image");
        session.run(&bootstrap_commands()).await?;

        tracing::info!("Waiting for the droplet to power down");
        self.wait_for_droplet(droplet_id, "droplet to power down", Droplet::power_off_status)
            .await?;

        tracing::info!("Creating snapshot {}", BASE_IMAGE_NAME);
        let started =
            droplet::snapshot(&self.api, droplet_id, BASE_IMAGE_NAME, self.settings.deadline())
                .await?;
        let api = &self.api;
        let deadline = self.settings.deadline();
        let action_id = started.id;
        poll_until(
            "snapshot to complete",
            IMAGE_MAKER_NAME,
            self.settings.poll_interval,
            deadline,
            move || async move {
                action::get(api, action_id, deadline)
                    .await
                    .map(|a| a.poll_status())
            },
        )
        .await?;

        let snapshotted = droplet::get(&self.api, droplet_id, self.settings.deadline()).await?;
        let image_id = *snapshotted
            .snapshot_ids
            .first()
            .ok_or(DigitalOceanError::NoSnapshot(droplet_id))?;

        tracing::info!("Snapshot complete, image id {}", image_id);
        config.image_id = Some(image_id);
        self.store.save(config)?;
        Ok(image_id)
    }

    async fn wait_for_droplet(
        &self,
        droplet_id: u64,
        what: &str,
        status: fn(&Droplet) -> boxflow_cloud::PollStatus<Droplet>,
    ) -> Result<Droplet> {
        let api = &self.api;
        let deadline = self.settings.deadline();
        let droplet = poll_until(
            what,
            IMAGE_MAKER_NAME,
            self.settings.poll_interval,
            deadline,
            move || async move {
                droplet::get(api, droplet_id, deadline)
                    .await
                    .map(|d| status(&d))
            },
        )
        .await?;
        Ok(droplet)
    }

    /// Best effort; a leftover droplet keeps costing money, so say so loudly
    async fn delete_image_maker(&self, droplet_id: u64) {
        tracing::info!("Deleting droplet {}", IMAGE_MAKER_NAME);
        if let Err(e) = droplet::delete(&self.api, droplet_id, self.settings.deadline()).await {
            tracing::warn!(
                "Unable to delete droplet {} ({}): {}. Please delete it in the DigitalOcean control panel",
                IMAGE_MAKER_NAME,
                droplet_id,
                e
            );
        }
    }
}
