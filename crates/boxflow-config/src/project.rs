//! Per-project checkpoint

use crate::error::{ConfigError, Result};
use crate::{get_config_dir, write_with_backup};
use boxflow_core::{project_hash, validate_project_name};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yml";
const DATA_DIR: &str = "data";

/// Project settings plus the identifiers of every remote resource created so far.
///
/// Identifier fields are only filled in after the matching remote create
/// succeeded. They are hints: callers always re-fetch before trusting them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub project_name: String,
    pub email: String,
    pub api_token: String,
    pub region: String,
    pub droplet_slug: String,
    pub volume_size: u32,
    pub bare_domain: String,
    pub private_key_path: PathBuf,

    pub image_id: Option<u64>,
    pub public_key_id: Option<u64>,
    pub volume_id: Option<String>,
    pub droplet_id: Option<u64>,
    pub droplet_public_ip: Option<String>,
    pub firewall_id: Option<String>,
}

impl ProjectConfig {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Default::default()
        }
    }

    /// Namespace for locally built images
    pub fn project_hash(&self) -> String {
        project_hash(&self.project_name)
    }

    /// `<private key>.pub`
    pub fn public_key_path(&self) -> PathBuf {
        let mut path = self.private_key_path.as_os_str().to_owned();
        path.push(".pub");
        PathBuf::from(path)
    }
}

/// Filesystem store rooted at the config dir
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Store rooted at [`get_config_dir`]
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(get_config_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    pub fn config_path(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(CONFIG_FILE)
    }

    /// Bind-mount root used in development mode
    pub fn data_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(DATA_DIR)
    }

    pub fn exists(&self, project: &str) -> bool {
        self.project_dir(project).exists()
    }

    /// Register a new project: validates the name, refuses an existing one,
    /// creates the data dir and writes the first checkpoint.
    pub fn create(&self, config: &ProjectConfig) -> Result<()> {
        validate_project_name(&config.project_name)?;
        if self.exists(&config.project_name) {
            return Err(ConfigError::ProjectExists(config.project_name.clone()));
        }

        std::fs::create_dir_all(self.data_dir(&config.project_name))?;
        self.save(config)
    }

    pub fn load(&self, project: &str) -> Result<ProjectConfig> {
        let path = self.config_path(project);
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::ProjectNotFound {
                project: project.to_string(),
                path: path.clone(),
            },
            _ => ConfigError::Io(e),
        })?;

        let config: ProjectConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Loaded checkpoint for project '{}'", project);
        Ok(config)
    }

    /// Whole-document rewrite of the checkpoint
    pub fn save(&self, config: &ProjectConfig) -> Result<()> {
        let path = self.config_path(&config.project_name);
        let content = serde_yaml::to_string(config).map_err(|source| ConfigError::Yaml {
            path: path.clone(),
            source,
        })?;

        write_with_backup(&path, &content)?;
        tracing::debug!("Saved checkpoint {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ProjectConfig {
        ProjectConfig {
            email: "ops@example.com".to_string(),
            api_token: "token".to_string(),
            region: "nyc3".to_string(),
            droplet_slug: "s-2vcpu-2gb".to_string(),
            volume_size: 1,
            bare_domain: "example.com".to_string(),
            private_key_path: PathBuf::from("/home/ops/.ssh/id_rsa"),
            ..ProjectConfig::new("shop")
        }
    }

    #[test]
    fn test_create_and_load() {
        let temp_dir = tempdir().unwrap();
        let store = ProjectStore::new(temp_dir.path());

        store.create(&sample()).unwrap();

        assert!(store.data_dir("shop").is_dir());
        let loaded = store.load("shop").unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded.image_id, None);
    }

    #[test]
    fn test_create_refuses_existing_project() {
        let temp_dir = tempdir().unwrap();
        let store = ProjectStore::new(temp_dir.path());

        store.create(&sample()).unwrap();
        assert!(matches!(
            store.create(&sample()),
            Err(ConfigError::ProjectExists(name)) if name == "shop"
        ));
    }

    #[test]
    fn test_create_validates_name() {
        let temp_dir = tempdir().unwrap();
        let store = ProjectStore::new(temp_dir.path());

        let config = ProjectConfig::new("Bad_Name");
        assert!(matches!(store.create(&config), Err(ConfigError::Core(_))));
        assert!(!store.exists("Bad_Name"));
    }

    #[test]
    fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let store = ProjectStore::new(temp_dir.path());
        let mut config = sample();
        store.create(&config).unwrap();

        config.droplet_id = Some(42);
        config.droplet_public_ip = Some("203.0.113.10".to_string());
        store.save(&config).unwrap();

        let loaded = store.load("shop").unwrap();
        assert_eq!(loaded.droplet_id, Some(42));
        assert!(temp_dir.path().join("shop/config.yml.backup").exists());
    }

    #[test]
    fn test_load_missing_project() {
        let temp_dir = tempdir().unwrap();
        let store = ProjectStore::new(temp_dir.path());

        let err = store.load("ghost").unwrap_err();
        assert!(matches!(err, ConfigError::ProjectNotFound { .. }));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let temp_dir = tempdir().unwrap();
        let store = ProjectStore::new(temp_dir.path());
        std::fs::create_dir_all(store.project_dir("shop")).unwrap();
        std::fs::write(
            store.config_path("shop"),
            "project_name: shop\nimage_id: 7\nlegacy_field: true\n",
        )
        .unwrap();

        let loaded = store.load("shop").unwrap();
        assert_eq!(loaded.image_id, Some(7));
        assert_eq!(loaded.volume_id, None);
    }

    #[test]
    fn test_public_key_path() {
        assert_eq!(
            sample().public_key_path(),
            PathBuf::from("/home/ops/.ssh/id_rsa.pub")
        );
    }
}
