//! ServiceSpec to container parameters

use crate::runtime::ContainerSpec;
use bollard::container::{Config, CreateContainerOptions};
use bollard::models::{HostConfig, PortBinding};
use boxflow_core::{PortMapping, ServiceSpec};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const PROJECT_LABEL: &str = "boxflow.project";
pub const SERVICE_LABEL: &str = "boxflow.service";

/// Build the container spec for `service`.
///
/// `data_dir` is the root that `@/...` volume hosts resolve against.
pub fn service_to_container_spec(
    service: &ServiceSpec,
    project: &str,
    project_hash: &str,
    data_dir: &Path,
) -> ContainerSpec {
    let binds = service
        .volumes
        .iter()
        .map(|v| {
            format!(
                "{}:{}:rw",
                v.host_path(data_dir).display(),
                v.container.display()
            )
        })
        .collect();

    let mut labels = HashMap::new();
    labels.insert(PROJECT_LABEL.to_string(), project.to_string());
    labels.insert(SERVICE_LABEL.to_string(), service.name.clone());

    ContainerSpec {
        name: service.container_name(),
        hostname: service.container_hostname(),
        image: service.resolved_image(project_hash),
        env: service.env(),
        ports: service.ports.clone(),
        binds,
        labels,
    }
}

/// Host directories of bind mounts that do not exist yet
pub fn missing_mount_dirs(service: &ServiceSpec, data_dir: &Path) -> Vec<PathBuf> {
    service
        .volumes
        .iter()
        .map(|v| v.host_path(data_dir))
        .filter(|p| !p.exists())
        .collect()
}

/// Create missing bind-mount host directories, owned by the invoking user
pub fn prepare_mount_dirs(service: &ServiceSpec, data_dir: &Path) -> std::io::Result<()> {
    for dir in missing_mount_dirs(service, data_dir) {
        tracing::info!("Preparing host bind mount point: {}", dir.display());
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Docker API parameters for a container spec. Ports bind to loopback only.
#[allow(deprecated)]
pub fn to_docker_config(spec: &ContainerSpec) -> (Config<String>, CreateContainerOptions<String>) {
    let mut port_bindings = HashMap::new();
    let mut exposed_ports = HashMap::new();

    for port in &spec.ports {
        let key = port.container_key();
        exposed_ports.insert(key.clone(), HashMap::new());
        port_bindings.insert(
            key,
            Some(vec![PortBinding {
                host_ip: Some(PortMapping::HOST_IP.to_string()),
                host_port: Some(port.host.to_string()),
            }]),
        );
    }

    let host_config = Some(HostConfig {
        port_bindings: Some(port_bindings),
        binds: Some(spec.binds.clone()),
        ..Default::default()
    });

    let config = Config {
        hostname: Some(spec.hostname.clone()),
        image: Some(spec.image.clone()),
        env: Some(spec.env.clone()),
        exposed_ports: Some(exposed_ports),
        host_config,
        labels: Some(spec.labels.clone()),
        ..Default::default()
    };

    let options = CreateContainerOptions {
        name: spec.name.clone(),
        platform: None,
    };

    (config, options)
}
