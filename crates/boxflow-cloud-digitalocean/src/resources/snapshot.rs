use boxflow_cloud::{CloudApi, Deadline, Result, delete as delete_path, get_json};
use serde::Deserialize;

/// Snapshot ids are strings on this endpoint even though droplets report them as integers
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct SnapshotList {
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

pub async fn list_droplet_snapshots<A: CloudApi + ?Sized>(
    api: &A,
    deadline: Deadline,
) -> Result<Vec<Snapshot>> {
    let list: SnapshotList =
        get_json(api, "/snapshots?resource_type=droplet&per_page=200", deadline).await?;
    Ok(list.snapshots)
}

pub async fn delete<A: CloudApi + ?Sized>(api: &A, id: &str, deadline: Deadline) -> Result<()> {
    delete_path(api, &format!("/snapshots/{}", id), deadline).await
}
