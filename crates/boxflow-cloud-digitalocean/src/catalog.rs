//! Region and droplet size slugs accepted by `box init`

use crate::error::{DigitalOceanError, Result};

pub const DEFAULT_REGION: &str = "nyc3";
pub const DEFAULT_SIZE: &str = "s-2vcpu-2gb";

/// Smallest size, used for image builds
pub const MIN_SIZE: &str = "s-1vcpu-1gb";

pub const REGIONS: &[&str] = &[
    "nyc1", "nyc2", "nyc3", "ams2", "ams3", "sfo1", "sfo2", "sfo3", "sgp1", "lon1", "fra1",
    "tor1", "blr1",
];

pub const SIZES: &[&str] = &[
    "s-1vcpu-1gb",
    "s-1vcpu-2gb",
    "s-1vcpu-3gb",
    "s-2vcpu-2gb",
    "s-2vcpu-4gb",
    "s-4vcpu-8gb",
    "s-6vcpu-16gb",
    "s-8vcpu-32gb",
    "s-12vcpu-48gb",
    "s-16vcpu-64gb",
    "s-20vcpu-96gb",
    "s-24vcpu-128gb",
    "s-32vcpu-192gb",
];

const REGION_NAMES: &[(&str, &str)] = &[
    ("nyc", "New York City, North America"),
    ("ams", "Amsterdam, Europe"),
    ("sfo", "San Francisco, North America"),
    ("sgp", "Singapore, Asia"),
    ("lon", "London, Europe"),
    ("fra", "Frankfurt, Europe"),
    ("tor", "Toronto, North America"),
    ("blr", "Bangalore, Asia"),
];

/// Human readable location of a region slug
pub fn region_name(slug: &str) -> Option<&'static str> {
    let slug = slug.to_lowercase();
    if !REGIONS.contains(&slug.as_str()) {
        return None;
    }
    REGION_NAMES
        .iter()
        .find(|(prefix, _)| slug.starts_with(prefix))
        .map(|(_, name)| *name)
}

/// Normalize and check a region slug
pub fn validate_region(slug: &str) -> Result<String> {
    let normalized = slug.trim().to_lowercase();
    if REGIONS.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(DigitalOceanError::InvalidRegion(slug.to_string()))
    }
}

/// Normalize and check a droplet size slug
pub fn validate_size(slug: &str) -> Result<String> {
    let normalized = slug.trim().to_lowercase();
    if SIZES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(DigitalOceanError::InvalidSize(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_region() {
        assert_eq!(validate_region("NYC3").unwrap(), "nyc3");
        assert_eq!(validate_region(DEFAULT_REGION).unwrap(), "nyc3");
        assert!(matches!(
            validate_region("mars1"),
            Err(DigitalOceanError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_validate_size() {
        assert_eq!(validate_size(DEFAULT_SIZE).unwrap(), "s-2vcpu-2gb");
        assert!(validate_size("s-64vcpu-1tb").is_err());
    }

    #[test]
    fn test_region_name() {
        assert_eq!(region_name("ams3"), Some("Amsterdam, Europe"));
        assert_eq!(region_name("BLR1"), Some("Bangalore, Asia"));
        assert_eq!(region_name("ams9"), None);
    }
}
