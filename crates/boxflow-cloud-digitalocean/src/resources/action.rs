use boxflow_cloud::{CloudApi, Deadline, PollStatus, Result, get_json};
use serde::Deserialize;

pub const STATUS_IN_PROGRESS: &str = "in-progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_ERRORED: &str = "errored";

/// An asynchronous operation on a droplet or volume
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Action {
    pub id: u64,
    pub status: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Deserialize)]
pub(crate) struct ActionEnvelope {
    pub action: Action,
}

impl Action {
    pub fn poll_status(&self) -> PollStatus<Action> {
        match self.status.as_str() {
            STATUS_IN_PROGRESS => PollStatus::Pending,
            STATUS_COMPLETED => PollStatus::Done(self.clone()),
            other => PollStatus::Failed(other.to_string()),
        }
    }
}

pub async fn get<A: CloudApi + ?Sized>(api: &A, id: u64, deadline: Deadline) -> Result<Action> {
    let envelope: ActionEnvelope = get_json(api, &format!("/actions/{}", id), deadline).await?;
    Ok(envelope.action)
}
