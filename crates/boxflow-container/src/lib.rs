pub mod converter;
pub mod docker;
pub mod error;
pub mod lifecycle;
pub mod lock;
pub mod progress;
pub mod runtime;

pub use converter::*;
pub use docker::*;
pub use error::*;
pub use lifecycle::*;
pub use lock::*;
pub use progress::*;
pub use runtime::*;
