//! Project identity helpers

use crate::error::{CoreError, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static PROJECT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9\-]{1,18}[a-z0-9]$").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("valid regex")
});

// Bare domains only: no subdomains, short TLD
static BARE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+\.\w{1,3}$").expect("valid regex"));

/// Project names: 3-20 chars, lowercase alnum or hyphen, starting with a letter.
pub fn validate_project_name(name: &str) -> Result<()> {
    if PROJECT_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidProjectName(name.to_string()))
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(CoreError::InvalidEmail(email.to_string()))
    }
}

/// `example.com` is accepted, `www.example.com` is not
pub fn validate_bare_domain(domain: &str) -> Result<()> {
    if BARE_DOMAIN_RE.is_match(domain) {
        Ok(())
    } else {
        Err(CoreError::InvalidDomain(domain.to_string()))
    }
}

/// First 12 hex chars of the SHA-256 of the project name.
///
/// Used as the namespace for locally built images.
pub fn project_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(12);
    hex
}

/// Deterministic remote resource name, e.g. `box-shop`
pub fn resource_name(project: &str) -> String {
    format!("box-{}", project.to_lowercase())
}
