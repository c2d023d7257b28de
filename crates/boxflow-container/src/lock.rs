//! Single active project lock

use crate::error::{ContainerError, Result};
use crate::runtime::{ContainerFilter, ContainerRuntime};
use boxflow_config::{RunLockFile, RunRecord};

/// Proof that `project` owns the local container host.
///
/// The record lives on disk; the lock value is owned by the lifecycle
/// manager that acquired it.
#[derive(Debug)]
pub struct ProjectLock {
    project: String,
    file: RunLockFile,
}

impl ProjectLock {
    /// Claim the host for `project`.
    ///
    /// Fails with `ProjectConflict` when managed containers exist and the
    /// run record does not name `project`.
    pub async fn acquire<R>(runtime: &R, file: RunLockFile, project: &str) -> Result<Self>
    where
        R: ContainerRuntime + ?Sized,
    {
        let record = file.read()?;
        let owner = record.as_ref().map(|r| r.project.as_str());

        if owner != Some(project) {
            let existing = runtime.list(&ContainerFilter::managed()).await?;
            if !existing.is_empty() {
                return Err(ContainerError::ProjectConflict {
                    running: owner.unwrap_or("unknown").to_string(),
                });
            }
        }

        file.write(&RunRecord::new(project))?;
        tracing::debug!("Acquired project lock for '{}'", project);

        Ok(Self {
            project: project.to_string(),
            file,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Clear the persisted record
    pub fn release(self) -> Result<()> {
        self.file.clear()?;
        tracing::debug!("Released project lock for '{}'", self.project);
        Ok(())
    }
}
