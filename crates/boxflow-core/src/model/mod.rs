//! Data model
//!
//! Services, their port and volume mappings, and the fixed set of core
//! services that every stack runs.

mod builtin;
mod port;
mod project;
mod service;
mod volume;

// Re-exports
pub use builtin::*;
pub use port::*;
pub use project::*;
pub use service::*;
pub use volume::*;
