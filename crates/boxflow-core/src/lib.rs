//! boxflow core
//!
//! The service model shared by every boxflow crate: service specs parsed
//! from `box.yml`, port and volume mappings, the built-in core services and
//! the tranche scheduler that orders startup by `depends_on`.

pub mod error;
pub mod manifest;
pub mod model;
pub mod schedule;

// Re-exports
pub use error::{CoreError, Result};
pub use manifest::{MANIFEST_FILE, Manifest};
pub use model::*;
pub use schedule::{Tranche, make_tranches};
