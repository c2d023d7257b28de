//! Port mappings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `host:container` TCP port mapping.
///
/// Host ports are always bound to the loopback interface; outside
/// connections are expected to be tunneled through SSH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

impl PortMapping {
    pub const HOST_IP: &'static str = "127.0.0.1";

    /// Docker port key, e.g. `80/tcp`
    pub fn container_key(&self) -> String {
        format!("{}/tcp", self.container)
    }
}

impl FromStr for PortMapping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, container) = s
            .split_once(':')
            .ok_or_else(|| format!("Port mapping {} must be in the form <host_port>:<container_port>", s))?;

        let parse = |part: &str| {
            part.parse::<u16>()
                .map_err(|_| format!("Port mapping {} is incorrect, '{}' is not a valid port", s, part))
        };

        Ok(Self {
            host: parse(host)?,
            container: parse(container)?,
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_mapping() {
        let port: PortMapping = "8080:80".parse().unwrap();
        assert_eq!(port.host, 8080);
        assert_eq!(port.container, 80);
        assert_eq!(port.container_key(), "80/tcp");
        assert_eq!(port.to_string(), "8080:80");
    }

    #[test]
    fn test_parse_port_mapping_rejects_garbage() {
        assert!("8080".parse::<PortMapping>().is_err());
        assert!("http:80".parse::<PortMapping>().is_err());
        assert!("70000:80".parse::<PortMapping>().is_err());
    }
}
