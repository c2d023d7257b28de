use boxflow_cloud::{CloudApi, Deadline, Result, get_json, post_json};
use serde::{Deserialize, Serialize};

const ALL_ADDRESSES: [&str; 2] = ["0.0.0.0/0", "::/0"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Firewall {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Addresses {
    pub addresses: Vec<String>,
}

impl Addresses {
    pub fn anywhere() -> Self {
        Self {
            addresses: ALL_ADDRESSES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundRule {
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    pub sources: Addresses,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRule {
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    pub destinations: Addresses,
}

impl InboundRule {
    fn open(protocol: &str, ports: Option<&str>) -> Self {
        Self {
            protocol: protocol.to_string(),
            ports: ports.map(str::to_string),
            sources: Addresses::anywhere(),
        }
    }
}

impl OutboundRule {
    fn open(protocol: &str, ports: Option<&str>) -> Self {
        Self {
            protocol: protocol.to_string(),
            ports: ports.map(str::to_string),
            destinations: Addresses::anywhere(),
        }
    }
}

/// SSH, HTTP, HTTPS and ping in; everything out
pub fn default_rules() -> (Vec<InboundRule>, Vec<OutboundRule>) {
    let inbound = vec![
        InboundRule::open("tcp", Some("22")),
        InboundRule::open("tcp", Some("80")),
        InboundRule::open("tcp", Some("443")),
        InboundRule::open("icmp", None),
    ];
    let outbound = vec![
        OutboundRule::open("icmp", None),
        OutboundRule::open("tcp", Some("all")),
        OutboundRule::open("udp", Some("all")),
    ];
    (inbound, outbound)
}

#[derive(Debug, Serialize)]
struct CreateFirewall<'a> {
    name: &'a str,
    inbound_rules: &'a [InboundRule],
    outbound_rules: &'a [OutboundRule],
    tags: &'a [String],
}

#[derive(Deserialize)]
struct FirewallEnvelope {
    firewall: Firewall,
}

pub async fn get<A: CloudApi + ?Sized>(api: &A, id: &str, deadline: Deadline) -> Result<Firewall> {
    let envelope: FirewallEnvelope = get_json(api, &format!("/firewalls/{}", id), deadline).await?;
    Ok(envelope.firewall)
}

/// Create a firewall applied to every droplet carrying one of `tags`
pub async fn create<A: CloudApi + ?Sized>(
    api: &A,
    name: &str,
    inbound_rules: &[InboundRule],
    outbound_rules: &[OutboundRule],
    tags: &[String],
    deadline: Deadline,
) -> Result<Firewall> {
    let body = CreateFirewall {
        name,
        inbound_rules,
        outbound_rules,
        tags,
    };
    let envelope: FirewallEnvelope = post_json(api, "/firewalls", &body, deadline).await?;
    Ok(envelope.firewall)
}
