use super::action::{Action, ActionEnvelope};
use boxflow_cloud::{CloudApi, Deadline, PollStatus, Result, delete as delete_path, get_json, post_json};
use serde::{Deserialize, Serialize};

pub const STATUS_NEW: &str = "new";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_OFF: &str = "off";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Droplet {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub snapshot_ids: Vec<u64>,
    #[serde(default)]
    pub volume_ids: Vec<String>,
    #[serde(default)]
    pub networks: Networks,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Networks {
    #[serde(default)]
    pub v4: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Address {
    pub ip_address: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Droplet {
    pub fn public_ipv4(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|a| a.kind == "public")
            .map(|a| a.ip_address.as_str())
    }

    pub fn has_volume(&self, volume_id: &str) -> bool {
        self.volume_ids.iter().any(|v| v == volume_id)
    }

    /// Status while waiting for boot: `new` is pending, `active` is success
    pub fn boot_status(&self) -> PollStatus<Droplet> {
        match self.status.as_str() {
            STATUS_NEW => PollStatus::Pending,
            STATUS_ACTIVE => PollStatus::Done(self.clone()),
            other => PollStatus::Failed(other.to_string()),
        }
    }

    /// Status while waiting for power-down
    pub fn power_off_status(&self) -> PollStatus<Droplet> {
        match self.status.as_str() {
            STATUS_OFF => PollStatus::Done(self.clone()),
            STATUS_NEW | STATUS_ACTIVE => PollStatus::Pending,
            other => PollStatus::Failed(other.to_string()),
        }
    }
}

/// Image to build a droplet from: a public slug or a private snapshot id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImageRef {
    Slug(String),
    Id(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDroplet {
    pub name: String,
    pub size: String,
    pub region: String,
    pub image: ImageRef,
    pub ssh_keys: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
struct DropletEnvelope {
    droplet: Droplet,
}

pub async fn get<A: CloudApi + ?Sized>(api: &A, id: u64, deadline: Deadline) -> Result<Droplet> {
    let envelope: DropletEnvelope = get_json(api, &format!("/droplets/{}", id), deadline).await?;
    Ok(envelope.droplet)
}

pub async fn create<A: CloudApi + ?Sized>(
    api: &A,
    request: &CreateDroplet,
    deadline: Deadline,
) -> Result<Droplet> {
    let envelope: DropletEnvelope = post_json(api, "/droplets", request, deadline).await?;
    Ok(envelope.droplet)
}

pub async fn delete<A: CloudApi + ?Sized>(api: &A, id: u64, deadline: Deadline) -> Result<()> {
    delete_path(api, &format!("/droplets/{}", id), deadline).await
}

/// Start a named snapshot of a powered-off droplet
pub async fn snapshot<A: CloudApi + ?Sized>(
    api: &A,
    id: u64,
    name: &str,
    deadline: Deadline,
) -> Result<Action> {
    let body = serde_json::json!({ "type": "snapshot", "name": name });
    let envelope: ActionEnvelope =
        post_json(api, &format!("/droplets/{}/actions", id), &body, deadline).await?;
    Ok(envelope.action)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DROPLET_JSON: &str = r#"{
        "droplet": {
            "id": 3164444,
            "name": "box-shop",
            "status": "active",
            "snapshot_ids": [],
            "volume_ids": ["506f78a4-e098-11e5-ad9f-000f53306ae1"],
            "networks": {
                "v4": [
                    {"ip_address": "10.128.192.124", "netmask": "255.255.0.0", "type": "private"},
                    {"ip_address": "192.241.165.154", "netmask": "255.255.255.0", "type": "public"}
                ],
                "v6": []
            },
            "tags": ["box-shop"]
        }
    }"#;

    #[test]
    fn test_decode_droplet() {
        let envelope: DropletEnvelope = serde_json::from_str(DROPLET_JSON).unwrap();
        let droplet = envelope.droplet;

        assert_eq!(droplet.public_ipv4(), Some("192.241.165.154"));
        assert!(droplet.has_volume("506f78a4-e098-11e5-ad9f-000f53306ae1"));
        assert!(matches!(droplet.boot_status(), PollStatus::Done(_)));
        assert_eq!(droplet.power_off_status(), PollStatus::Pending);
    }

    #[test]
    fn test_boot_status_unexpected() {
        let droplet = Droplet {
            status: "archive".to_string(),
            ..Default::default()
        };
        assert_eq!(
            droplet.boot_status(),
            PollStatus::Failed("archive".to_string())
        );
    }

    #[test]
    fn test_create_request_body() {
        let request = CreateDroplet {
            name: "box-shop".to_string(),
            size: "s-2vcpu-2gb".to_string(),
            region: "nyc3".to_string(),
            image: ImageRef::Id(7),
            ssh_keys: vec![512190],
            tags: vec!["box-shop".to_string()],
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["image"], 7);
        assert_eq!(body["ssh_keys"][0], 512190);

        let public = CreateDroplet {
            image: ImageRef::Slug("ubuntu-20-04-x64".to_string()),
            tags: Vec::new(),
            ..request
        };
        let body = serde_json::to_value(&public).unwrap();
        assert_eq!(body["image"], "ubuntu-20-04-x64");
        assert!(body.get("tags").is_none());
    }
}
