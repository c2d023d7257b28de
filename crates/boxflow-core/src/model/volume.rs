//! Bind-mount volume mappings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Host paths starting with this marker are resolved against the project data directory.
pub const DATA_DIR_MARKER: char = '@';

/// A `host:container` bind mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMapping {
    pub host: String,
    pub container: PathBuf,
}

impl VolumeMapping {
    /// Resolve the host side, expanding `@/...` under `data_dir`.
    pub fn host_path(&self, data_dir: &Path) -> PathBuf {
        match self.host.strip_prefix(DATA_DIR_MARKER) {
            Some(rest) => data_dir.join(rest.trim_start_matches('/')),
            None => PathBuf::from(&self.host),
        }
    }

    pub fn is_data_dir_relative(&self) -> bool {
        self.host.starts_with(DATA_DIR_MARKER)
    }
}

impl FromStr for VolumeMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            format!(
                "Volume \"{}\" is invalid. Only bind mount volumes are supported. Eg: /var/log/mylogs:/var/log/something",
                s
            )
        };

        let (host, container) = s.split_once(':').ok_or_else(invalid)?;
        if host.is_empty() || !container.starts_with('/') || container.contains(':') {
            return Err(invalid());
        }
        if !matches!(host.chars().next(), Some('/' | '.' | DATA_DIR_MARKER)) {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            container: PathBuf::from(container),
        })
    }
}
