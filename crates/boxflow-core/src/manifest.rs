//! `box.yml` manifest loading and validation

use crate::error::{CoreError, Result};
use crate::model::{BuildSpec, PortMapping, Routing, ServiceSpec, VolumeMapping, is_core_service};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const MANIFEST_FILE: &str = "box.yml";

static HOSTNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{3,20}$").expect("valid regex"));

/// A validated project manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub project: String,
    pub runtime_env: Option<String>,
    /// Services keyed by name
    pub services: BTreeMap<String, ServiceSpec>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    project: String,
    #[serde(default)]
    runtime_env: Option<String>,
    #[serde(default)]
    services: BTreeMap<String, RawService>,
}

#[derive(Debug, Default, Deserialize)]
struct RawService {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    image: String,
    #[serde(default)]
    environment: BTreeMap<String, String>,
    #[serde(default)]
    ports: Vec<String>,
    #[serde(default)]
    volumes: Vec<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    routing: Option<Routing>,
    #[serde(default)]
    build: Option<BuildSpec>,
}

impl Manifest {
    /// Load `box.yml` from `dir`
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(MANIFEST_FILE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ManifestNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::parse(&content, base_dir).map_err(|e| match e {
            CoreError::ManifestParse { message, .. } => CoreError::ManifestParse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate manifest text; build contexts resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let raw: RawManifest =
            serde_yaml::from_str(content).map_err(|e| CoreError::ManifestParse {
                path: PathBuf::from(MANIFEST_FILE),
                message: e.to_string(),
            })?;

        let mut services = BTreeMap::new();
        for (name, raw_service) in raw.services {
            let service = validate_service(&name, raw_service, base_dir)?;
            services.insert(name, service);
        }

        tracing::debug!(
            "Loaded manifest for project '{}' with {} services",
            raw.project,
            services.len()
        );

        Ok(Self {
            project: raw.project,
            runtime_env: raw.runtime_env,
            services,
        })
    }

    pub fn service_list(&self) -> Vec<ServiceSpec> {
        self.services.values().cloned().collect()
    }

    /// Services that carry a build descriptor
    pub fn buildable_services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.services.values().filter(|s| s.build.is_some())
    }
}

fn invalid(service: &str, message: impl Into<String>) -> CoreError {
    CoreError::InvalidService {
        service: service.to_string(),
        message: message.into(),
    }
}

fn validate_service(name: &str, raw: RawService, base_dir: &Path) -> Result<ServiceSpec> {
    if is_core_service(name) {
        return Err(CoreError::ReservedServiceName(name.to_string()));
    }

    if let Some(hostname) = &raw.hostname {
        if !HOSTNAME_RE.is_match(hostname) {
            return Err(invalid(
                name,
                format!(
                    "Hostname \"{}\" must contain only lowercase alpha characters, and be between 3 and 20 characters long",
                    hostname
                ),
            ));
        }
        if raw
            .routing
            .as_ref()
            .is_some_and(|r| !r.path.pattern.is_empty() || r.port != 0)
        {
            return Err(invalid(
                name,
                "Cannot specify a hostname and a routing configuration, since routings rely on dynamically assigned hostnames",
            ));
        }
    }

    let ports = raw
        .ports
        .iter()
        .map(|p| p.parse::<PortMapping>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid(name, e))?;

    let volumes = raw
        .volumes
        .iter()
        .map(|v| v.parse::<VolumeMapping>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid(name, e))?;

    if let Some(build) = &raw.build {
        let context = base_dir.join(&build.context);
        if !context.exists() {
            return Err(invalid(
                name,
                format!("Unable to locate build context path: {}", context.display()),
            ));
        }
        let dockerfile = context.join(&build.dockerfile);
        if !dockerfile.exists() {
            return Err(invalid(
                name,
                format!("Unable to locate dockerfile path: {}", dockerfile.display()),
            ));
        }
    }

    if raw.image.is_empty() {
        return Err(invalid(name, "Must specify an image name"));
    }

    Ok(ServiceSpec {
        name: name.to_string(),
        hostname: raw.hostname,
        image: raw.image,
        environment: raw.environment,
        ports,
        volumes,
        depends_on: raw.depends_on,
        routing: raw.routing,
        build: raw.build.map(|b| BuildSpec {
            context: base_dir.join(b.context),
            dockerfile: b.dockerfile,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const BASIC: &str = r#"
project: shop
services:
  db:
    image: postgres:16
    volumes:
      - "@/pg:/var/lib/postgresql/data"
  api:
    image: "@/api"
    ports:
      - "8080:80"
    environment:
      DATABASE_URL: postgres://db/shop
    depends_on:
      - db
  web:
    image: nginx
    routing:
      path:
        pattern: /shop
        type: prefix
      port: 80
    depends_on: [api]
"#;

    #[test]
    fn test_parse_basic_manifest() {
        let manifest = Manifest::parse(BASIC, Path::new(".")).unwrap();

        assert_eq!(manifest.project, "shop");
        assert_eq!(manifest.services.len(), 3);

        let api = &manifest.services["api"];
        assert_eq!(api.name, "api");
        assert_eq!(api.ports[0].host, 8080);
        assert_eq!(api.depends_on, vec!["db".to_string()]);
        assert_eq!(api.env(), vec!["DATABASE_URL=postgres://db/shop".to_string()]);

        let web = &manifest.services["web"];
        assert!(web.has_path_routing());
        assert_eq!(web.container_name(), "box__web_1");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let yaml = "project: shop\nfuture_setting: 1\nservices:\n  db:\n    image: redis\n    replicas: 3\n";
        let manifest = Manifest::parse(yaml, Path::new(".")).unwrap();
        assert_eq!(manifest.services["db"].image, "redis");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let yaml = "project: shop\nservices:\n  db:\n    image: redis\n    ports: [\"6379\"]\n";
        let err = Manifest::parse(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidService { service, .. } if service == "db"));
    }

    #[test]
    fn test_core_service_name_is_rejected() {
        for name in ["router", "registry", "cron"] {
            let yaml = format!("project: shop\nservices:\n  {}:\n    image: nginx\n", name);
            let err = Manifest::parse(&yaml, Path::new(".")).unwrap_err();
            assert!(matches!(err, CoreError::ReservedServiceName(ref n) if n == name));
        }
    }

    #[test]
    fn test_invalid_volume_is_rejected() {
        let yaml = "project: shop\nservices:\n  db:\n    image: redis\n    volumes: [\"data:/data\"]\n";
        assert!(Manifest::parse(yaml, Path::new(".")).is_err());
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let yaml = "project: shop\nservices:\n  db:\n    hostname: database\n";
        let err = Manifest::parse(yaml, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("Must specify an image name"));
    }

    #[test]
    fn test_hostname_with_routing_is_rejected() {
        let yaml = "project: shop\nservices:\n  web:\n    image: nginx\n    hostname: frontend\n    routing:\n      port: 80\n";
        let err = Manifest::parse(yaml, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("routing"));
    }

    #[test]
    fn test_invalid_hostname_is_rejected() {
        let yaml = "project: shop\nservices:\n  web:\n    image: nginx\n    hostname: Web-1\n";
        assert!(Manifest::parse(yaml, Path::new(".")).is_err());
    }

    #[test]
    fn test_build_context_resolution() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("api")).unwrap();
        fs::write(temp_dir.path().join("api/Dockerfile"), "FROM scratch").unwrap();

        let yaml = "project: shop\nservices:\n  api:\n    image: \"@/api\"\n    build:\n      context: api\n";
        let manifest = Manifest::parse(yaml, temp_dir.path()).unwrap();

        let build = manifest.services["api"].build.as_ref().unwrap();
        assert_eq!(build.context, temp_dir.path().join("api"));
        assert_eq!(build.dockerfile, PathBuf::from("Dockerfile"));
        assert_eq!(manifest.buildable_services().count(), 1);
    }

    #[test]
    fn test_missing_build_context_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let yaml = "project: shop\nservices:\n  api:\n    image: \"@/api\"\n    build:\n      context: missing\n";
        assert!(Manifest::parse(yaml, temp_dir.path()).is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(MANIFEST_FILE), BASIC).unwrap();

        let manifest = Manifest::load_from_dir(temp_dir.path()).unwrap();
        assert_eq!(manifest.project, "shop");
    }

    #[test]
    fn test_load_missing_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Manifest::load_from_dir(temp_dir.path()),
            Err(CoreError::ManifestNotFound(_))
        ));
    }
}
