//! boxflow cloud plumbing
//!
//! Provider-independent pieces of remote provisioning: the REST seam
//! ([`CloudApi`]), deadlines and status polling, the remote shell seam and
//! timing settings. Provider crates build their pipelines on top of these.

pub mod api;
pub mod deadline;
pub mod error;
pub mod settings;
pub mod shell;

// Re-exports
pub use api::{CloudApi, delete, get_json, post_json};
pub use deadline::{Deadline, PollStatus, poll_until};
pub use error::{ApiError, ApiErrorKind, CloudError, Result};
pub use settings::Settings;
pub use shell::{RemoteShell, ShellCredentials, ShellSession, connect_with_retry, join_commands};
