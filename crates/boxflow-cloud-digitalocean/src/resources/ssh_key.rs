use boxflow_cloud::{CloudApi, Deadline, Result, get_json, post_json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SshKey {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub public_key: String,
}

impl SshKey {
    /// Compare key material, ignoring surrounding whitespace
    pub fn matches(&self, public_key: &str) -> bool {
        self.public_key.trim() == public_key.trim()
    }
}

#[derive(Debug, Serialize)]
struct CreateKey<'a> {
    name: &'a str,
    public_key: &'a str,
}

#[derive(Deserialize)]
struct KeyEnvelope {
    ssh_key: SshKey,
}

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    ssh_keys: Vec<SshKey>,
}

pub async fn list<A: CloudApi + ?Sized>(api: &A, deadline: Deadline) -> Result<Vec<SshKey>> {
    let list: KeyList = get_json(api, "/account/keys?per_page=200", deadline).await?;
    Ok(list.ssh_keys)
}

pub async fn create<A: CloudApi + ?Sized>(
    api: &A,
    name: &str,
    public_key: &str,
    deadline: Deadline,
) -> Result<SshKey> {
    let body = CreateKey { name, public_key };
    let envelope: KeyEnvelope = post_json(api, "/account/keys", &body, deadline).await?;
    Ok(envelope.ssh_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_ignores_trailing_newline() {
        let key = SshKey {
            id: 1,
            name: "box-key-shop".to_string(),
            public_key: "ssh-ed25519 AAAAC3Nza dev@laptop".to_string(),
        };
        assert!(key.matches("ssh-ed25519 AAAAC3Nza dev@laptop\n"));
        assert!(!key.matches("ssh-ed25519 AAAAOTHER dev@laptop"));
    }
}
