//! Run-lock record
//!
//! `.run.yml` names the project that last claimed the local Docker host.

use crate::error::{ConfigError, Result};
use crate::{get_config_dir, write_with_backup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const RUN_FILE: &str = ".run.yml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub project: String,
    #[serde(default)]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            acquired_at: Some(Utc::now()),
        }
    }
}

/// Handle on the `.run.yml` file
#[derive(Debug, Clone)]
pub struct RunLockFile {
    path: PathBuf,
}

impl RunLockFile {
    /// Lock file inside the given config root
    pub fn in_dir(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(RUN_FILE),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::in_dir(get_config_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current record. An unparsable record counts as absent.
    pub fn read(&self) -> Result<Option<RunRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::Io(e)),
        };

        match serde_yaml::from_str::<RunRecord>(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable run record {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn write(&self, record: &RunRecord) -> Result<()> {
        let content = serde_yaml::to_string(record).map_err(|source| ConfigError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        write_with_backup(&self.path, &content)?;
        tracing::debug!("Run lock claimed by '{}'", record.project);
        Ok(())
    }

    /// Remove the record; a missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Run lock cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }
}
