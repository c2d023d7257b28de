use super::action::{Action, ActionEnvelope};
use boxflow_cloud::{CloudApi, Deadline, Result, get_json, post_json};
use serde::{Deserialize, Serialize};

/// Block storage volume
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size_gigabytes: u32,
    #[serde(default)]
    pub droplet_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
struct CreateVolume<'a> {
    size_gigabytes: u32,
    name: &'a str,
    region: &'a str,
}

#[derive(Deserialize)]
struct VolumeEnvelope {
    volume: Volume,
}

pub async fn get<A: CloudApi + ?Sized>(api: &A, id: &str, deadline: Deadline) -> Result<Volume> {
    let envelope: VolumeEnvelope = get_json(api, &format!("/volumes/{}", id), deadline).await?;
    Ok(envelope.volume)
}

pub async fn create<A: CloudApi + ?Sized>(
    api: &A,
    name: &str,
    region: &str,
    size_gigabytes: u32,
    deadline: Deadline,
) -> Result<Volume> {
    let body = CreateVolume {
        size_gigabytes,
        name,
        region,
    };
    let envelope: VolumeEnvelope = post_json(api, "/volumes", &body, deadline).await?;
    Ok(envelope.volume)
}

/// Start attaching the volume to a droplet in the same region
pub async fn attach<A: CloudApi + ?Sized>(
    api: &A,
    id: &str,
    droplet_id: u64,
    region: &str,
    deadline: Deadline,
) -> Result<Action> {
    let body = serde_json::json!({
        "type": "attach",
        "droplet_id": droplet_id,
        "region": region,
    });
    let envelope: ActionEnvelope =
        post_json(api, &format!("/volumes/{}/actions", id), &body, deadline).await?;
    Ok(envelope.action)
}
