//! Container runtime abstraction

use crate::error::Result;
use async_trait::async_trait;
use boxflow_core::{MANAGED_PREFIX, PortMapping};
use futures_util::stream::BoxStream;
use std::collections::HashMap;

/// Everything needed to create one container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    pub hostname: String,
    pub image: String,
    pub env: Vec<String>,
    pub ports: Vec<PortMapping>,
    /// `host:container:mode` bind strings
    pub binds: Vec<String>,
    pub labels: HashMap<String, String>,
}

/// A created container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

/// Selects containers by name prefix, running or stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerFilter {
    pub name_prefix: String,
}

impl ContainerFilter {
    /// Every container boxflow manages
    pub fn managed() -> Self {
        Self {
            name_prefix: MANAGED_PREFIX.to_string(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name.trim_start_matches('/').starts_with(&self.name_prefix)
    }
}

/// One line of image pull output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullProgress {
    pub status: String,
    pub progress: Option<String>,
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create (but do not start) a container
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerHandle>;

    async fn start(&self, id: &str) -> Result<()>;

    /// Stop a container; stopping an already stopped one succeeds.
    async fn stop(&self, id: &str) -> Result<()>;

    async fn remove(&self, id: &str) -> Result<()>;

    async fn list(&self, filter: &ContainerFilter) -> Result<Vec<ContainerHandle>>;

    async fn image_exists(&self, image: &str) -> Result<bool>;

    fn pull<'a>(&'a self, image: &'a str) -> BoxStream<'a, Result<PullProgress>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_filter() {
        let filter = ContainerFilter::managed();
        assert!(filter.matches("/box__router"));
        assert!(filter.matches("box__web_1"));
        assert!(!filter.matches("/postgres"));
        assert!(!filter.matches("/my-box__thing"));
    }
}
