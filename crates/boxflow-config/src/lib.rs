//! boxflow configuration store
//!
//! Every project keeps a YAML checkpoint under `~/.box.do/<project>/config.yml`
//! together with a `data/` directory used as the bind-mount root in
//! development. The run-lock record `~/.box.do/.run.yml` names the project
//! whose containers currently own the local Docker host.

pub mod error;
pub mod project;
pub mod run_lock;

pub use error::*;
pub use project::{ProjectConfig, ProjectStore};
pub use run_lock::{RunLockFile, RunRecord};

use std::path::PathBuf;

const CONFIG_DIR_NAME: &str = ".box.do";

/// Environment variable overriding the config root
pub const CONFIG_DIR_ENV: &str = "BOX_CONFIG_DIR";

/// Resolve the config root: `$BOX_CONFIG_DIR`, else `~/.box.do`.
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::ConfigDirNotFound)
}

fn sibling(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `content` to `path`, keeping the previous document as `<path>.backup`.
///
/// The new document is written next to `path` and renamed over it, so `path`
/// always holds either the old or the new document.
pub(crate) fn write_with_backup(path: &std::path::Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let staged = sibling(path, ".tmp");
    std::fs::write(&staged, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o600))?;
    }

    if path.exists() {
        std::fs::copy(path, sibling(path, ".backup"))?;
    }
    std::fs::rename(&staged, path)?;

    Ok(())
}
