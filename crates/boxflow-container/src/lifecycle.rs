//! Container lifecycle
//!
//! `start` runs the whole `up` pipeline: claim the project lock, clear out
//! stale managed containers, make sure every image is present, create all
//! containers, then start them tranche by tranche. Creation failures remove
//! whatever was created in the run; start failures tear the stack down.

use crate::converter::{prepare_mount_dirs, service_to_container_spec};
use crate::error::{ContainerError, Result};
use crate::lock::ProjectLock;
use crate::progress::pull_image;
use crate::runtime::{ContainerFilter, ContainerHandle, ContainerRuntime};
use boxflow_config::RunLockFile;
use boxflow_core::{
    CoreError, Manifest, ServiceSpec, Tranche, core_services, is_core_service, make_tranches,
};
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Bind-mount root on a provisioned remote host
pub const PRODUCTION_DATA_DIR: &str = "/mnt/data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    /// Lock held, nothing created yet
    Locking,
    Creating,
    Starting,
    Running,
    RollingBack,
}

#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    pub project: String,
    pub project_hash: String,
    pub data_dir: PathBuf,
    pub production: bool,
    pub pull_timeout: Option<Duration>,
}

pub struct ContainerLifecycleManager<R: ContainerRuntime> {
    runtime: R,
    options: LifecycleOptions,
    lock_file: RunLockFile,
    lock: Option<ProjectLock>,
    handles: BTreeMap<String, ContainerHandle>,
    state: LifecycleState,
}

impl<R: ContainerRuntime> ContainerLifecycleManager<R> {
    pub fn new(runtime: R, lock_file: RunLockFile, options: LifecycleOptions) -> Self {
        Self {
            runtime,
            options,
            lock_file,
            lock: None,
            handles: BTreeMap::new(),
            state: LifecycleState::Idle,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn lock(&self) -> Option<&ProjectLock> {
        self.lock.as_ref()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Containers created in the current run, keyed by service name
    pub fn handles(&self) -> &BTreeMap<String, ContainerHandle> {
        &self.handles
    }

    pub async fn acquire_project_lock(&mut self) -> Result<()> {
        if self.lock.is_some() {
            return Ok(());
        }

        self.state = LifecycleState::Locking;
        match ProjectLock::acquire(&self.runtime, self.lock_file.clone(), &self.options.project)
            .await
        {
            Ok(lock) => {
                self.lock = Some(lock);
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Idle;
                Err(e)
            }
        }
    }

    /// Pull every distinct image that is not available locally
    pub async fn ensure_images(&self, services: &[ServiceSpec]) -> Result<()> {
        let mut seen = HashSet::new();
        for service in services {
            let image = service.resolved_image(&self.options.project_hash);
            if !seen.insert(image.clone()) {
                continue;
            }

            if self.runtime.image_exists(&image).await? {
                tracing::info!("Image {} available locally, skipping...", image);
                continue;
            }

            pull_image(&self.runtime, &image, self.options.pull_timeout).await?;
        }
        Ok(())
    }

    /// Create one container per service without starting it.
    ///
    /// On failure every container created in this call is removed again.
    pub async fn create_all(&mut self, services: &[ServiceSpec]) -> Result<()> {
        self.state = LifecycleState::Creating;

        let mut created = Vec::new();
        let mut failure = None;

        for service in services {
            tracing::info!("Creating container for service {}", service.name);
            let spec = service_to_container_spec(
                service,
                &self.options.project,
                &self.options.project_hash,
                &self.options.data_dir,
            );

            let result = match prepare_mount_dirs(service, &self.options.data_dir) {
                Ok(()) => self.runtime.create(&spec).await,
                Err(e) => Err(ContainerError::Io(e)),
            };

            match result {
                Ok(handle) => created.push((service.name.clone(), handle)),
                Err(e) => {
                    failure = Some(ContainerError::CreateFailed {
                        service: service.name.clone(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        if let Some(err) = failure {
            tracing::error!("{}", err);
            self.state = LifecycleState::RollingBack;
            for (_, handle) in &created {
                tracing::info!("Removing container {}", handle.name);
                if let Err(e) = self.runtime.remove(&handle.id).await {
                    tracing::warn!(
                        "Unable to remove container {} ({}), remove it manually: {}",
                        handle.name,
                        handle.id,
                        e
                    );
                }
            }
            self.state = LifecycleState::Idle;
            return Err(err);
        }

        self.handles.extend(created);
        Ok(())
    }

    /// Start the core tranche, then each given tranche in order.
    ///
    /// Members of a tranche start concurrently and are all awaited before the
    /// outcome is checked. Any failure tears the whole stack down.
    pub async fn start_tranches(&mut self, tranches: &[Tranche]) -> Result<()> {
        self.state = LifecycleState::Starting;

        let core = Tranche::new(core_services(self.options.production));
        let ordered = std::iter::once(&core).chain(tranches.iter());

        let mut failure = None;
        for tranche in ordered {
            tracing::info!("Starting tranche: {}", tranche.names().join(", "));

            let runtime = &self.runtime;
            let handles = &self.handles;
            let results = join_all(tranche.iter().map(|service| async move {
                let handle = handles.get(&service.name).ok_or_else(|| {
                    ContainerError::DockerApiError("container was never created".to_string())
                })?;
                runtime.start(&handle.id).await
            }))
            .await;

            failure = tranche
                .iter()
                .zip(results)
                .find_map(|(service, result)| {
                    result.err().map(|e| ContainerError::StartFailed {
                        service: service.name.clone(),
                        message: e.to_string(),
                    })
                });
            if failure.is_some() {
                break;
            }
        }

        if let Some(err) = failure {
            tracing::error!("{}", err);
            self.state = LifecycleState::RollingBack;
            if let Err(e) = self.shutdown().await {
                tracing::warn!("Teardown after failed start did not complete: {}", e);
            }
            return Err(err);
        }

        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Stop and remove every managed container, then clear the run lock.
    ///
    /// Safe to call repeatedly. Individual stop/remove failures are logged.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.remove_managed_containers().await?;
        self.handles.clear();

        match self.lock.take() {
            Some(lock) => lock.release()?,
            None => self.lock_file.clear()?,
        }

        self.state = LifecycleState::Idle;
        Ok(())
    }

    /// Full `up` pipeline
    pub async fn start(&mut self, manifest: &Manifest) -> Result<()> {
        let user_services = manifest.service_list();
        if let Some(clash) = user_services.iter().find(|s| is_core_service(&s.name)) {
            return Err(CoreError::ReservedServiceName(clash.name.clone()).into());
        }
        let tranches = make_tranches(&user_services)?;

        self.acquire_project_lock().await?;
        self.remove_managed_containers().await?;

        let mut services = core_services(self.options.production);
        services.extend(user_services);

        self.ensure_images(&services).await?;
        self.create_all(&services).await?;
        self.start_tranches(&tranches).await
    }

    async fn remove_managed_containers(&self) -> Result<()> {
        let containers = self.runtime.list(&ContainerFilter::managed()).await?;
        if containers.is_empty() {
            return Ok(());
        }

        let runtime = &self.runtime;

        let stops = join_all(containers.iter().map(|c| async move {
            tracing::info!("Stopping container {}", c.name);
            (c, runtime.stop(&c.id).await)
        }))
        .await;
        for (c, result) in stops {
            if let Err(e) = result {
                tracing::warn!("Unable to stop container {}: {}", c.name, e);
            }
        }

        let removals = join_all(containers.iter().map(|c| async move {
            tracing::info!("Removing container {}", c.name);
            (c, runtime.remove(&c.id).await)
        }))
        .await;
        for (c, result) in removals {
            if let Err(e) = result {
                tracing::warn!(
                    "Unable to remove container {}, remove it manually with `docker rm -f {}`: {}",
                    c.name,
                    c.id,
                    e
                );
            }
        }

        Ok(())
    }
}
