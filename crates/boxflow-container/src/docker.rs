//! Docker runtime over bollard

use crate::converter::to_docker_config;
use crate::error::{ContainerError, Result};
use crate::runtime::{ContainerFilter, ContainerHandle, ContainerRuntime, ContainerSpec, PullProgress};
use async_trait::async_trait;
use bollard::Docker;
use futures_util::stream::{BoxStream, StreamExt};
use std::collections::HashMap;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect with local defaults and ping the daemon
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;
        docker
            .ping()
            .await
            .map_err(|e| ContainerError::DockerConnectionFailed(e.to_string()))?;
        Ok(Self::new(docker))
    }
}

/// Split `name:tag`, defaulting to `latest`. A registry port is not a tag.
fn parse_image_tag(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, tag),
        _ => (image, "latest"),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        let (config, options) = to_docker_config(spec);
        tracing::debug!("Creating container {}", spec.name);

        #[allow(deprecated)]
        let response = self.docker.create_container(Some(options), config).await?;
        for warning in &response.warnings {
            tracing::warn!("{}: {}", spec.name, warning);
        }

        Ok(ContainerHandle {
            id: response.id,
            name: spec.name.clone(),
        })
    }

    async fn start(&self, id: &str) -> Result<()> {
        match self
            .docker
            .start_container(id, None::<bollard::query_parameters::StartContainerOptions>)
            .await
        {
            Ok(_)
            | Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn stop(&self, id: &str) -> Result<()> {
        match self
            .docker
            .stop_container(id, None::<bollard::query_parameters::StopContainerOptions>)
            .await
        {
            Ok(_)
            | Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, id: &str) -> Result<()> {
        match self
            .docker
            .remove_container(id, None::<bollard::query_parameters::RemoveContainerOptions>)
            .await
        {
            Ok(_)
            | Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, filter: &ContainerFilter) -> Result<Vec<ContainerHandle>> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![filter.name_prefix.clone()]);

        #[allow(deprecated)]
        let options = bollard::container::ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        #[allow(deprecated)]
        let containers = self.docker.list_containers(Some(options)).await?;

        // The name filter is a substring match, so the prefix is checked again here.
        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let name = c
                    .names
                    .as_ref()?
                    .iter()
                    .find(|n| filter.matches(n))?
                    .trim_start_matches('/')
                    .to_string();
                Some(ContainerHandle { id: c.id?, name })
            })
            .collect())
    }

    async fn image_exists(&self, image: &str) -> Result<bool> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn pull<'a>(&'a self, image: &'a str) -> BoxStream<'a, Result<PullProgress>> {
        let (from_image, tag) = parse_image_tag(image);

        #[allow(deprecated)]
        let options = bollard::image::CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };

        #[allow(deprecated)]
        let stream = self.docker.create_image(
            Some(options),
            None,
            None::<bollard::auth::DockerCredentials>,
        );

        stream
            .map(move |info| {
                info.map(|info| PullProgress {
                    status: info.status.unwrap_or_default(),
                    progress: info.progress,
                })
                .map_err(|e| ContainerError::PullFailed {
                    image: image.to_string(),
                    message: e.to_string(),
                })
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_tag() {
        assert_eq!(parse_image_tag("redis:7-alpine"), ("redis", "7-alpine"));
        assert_eq!(parse_image_tag("postgres"), ("postgres", "latest"));
        assert_eq!(
            parse_image_tag("localhost:5000/web"),
            ("localhost:5000/web", "latest")
        );
        assert_eq!(
            parse_image_tag("localhost:5000/web:v2"),
            ("localhost:5000/web", "v2")
        );
    }
}
