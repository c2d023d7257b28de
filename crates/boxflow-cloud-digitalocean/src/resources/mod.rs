//! Typed DigitalOcean resources and the endpoints that manage them
//!
//! List endpoints fetch a single page of up to 200 items.

pub mod action;
pub mod domain;
pub mod droplet;
pub mod firewall;
pub mod snapshot;
pub mod ssh_key;
pub mod tag;
pub mod volume;

pub use action::Action;
pub use domain::{Domain, DomainRecord};
pub use droplet::{CreateDroplet, Droplet, ImageRef};
pub use firewall::{Addresses, Firewall, InboundRule, OutboundRule};
pub use snapshot::Snapshot;
pub use ssh_key::SshKey;
pub use volume::Volume;
