//! Service definitions

use super::port::PortMapping;
use super::volume::VolumeMapping;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Every container managed by boxflow carries this name prefix.
pub const MANAGED_PREFIX: &str = "box__";

/// Image references with this prefix are built locally (`box build`).
pub const LOCAL_IMAGE_PREFIX: &str = "@/";

/// A single service of the stack
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub hostname: Option<String>,
    pub image: String,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub volumes: Vec<VolumeMapping>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub routing: Option<Routing>,
    pub build: Option<BuildSpec>,
}

/// Reverse-proxy routing descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Routing {
    #[serde(default)]
    pub path: PathRoute,
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathRoute {
    #[serde(default)]
    pub pattern: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Local image build descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    #[serde(default)]
    pub context: PathBuf,
    #[serde(default = "default_dockerfile")]
    pub dockerfile: PathBuf,
}

fn default_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile")
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Hostname override, falling back to the service name
    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.name)
    }

    pub fn has_path_routing(&self) -> bool {
        self.routing
            .as_ref()
            .is_some_and(|r| !r.path.pattern.is_empty())
    }

    /// Container name: `box__<name>`, with a `_1` replica suffix for routed services
    pub fn container_name(&self) -> String {
        let name = format!("{}{}", MANAGED_PREFIX, self.name);
        if self.has_path_routing() {
            format!("{}_1", name)
        } else {
            name
        }
    }

    pub fn container_hostname(&self) -> String {
        if self.has_path_routing() {
            format!("{}_1", self.hostname())
        } else {
            self.hostname().to_string()
        }
    }

    /// Resolve the image reference; local images live under the project hash namespace.
    pub fn resolved_image(&self, project_hash: &str) -> String {
        match self.image.strip_prefix(LOCAL_IMAGE_PREFIX) {
            Some(local) => format!("{}/{}", project_hash, local),
            None => self.image.clone(),
        }
    }

    /// `KEY=value` pairs for the container environment
    pub fn env(&self) -> Vec<String> {
        self.environment
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }
}
