//! Remote environment provisioning
//!
//! Brings the project's DigitalOcean resources to the desired state: domain
//! entry, firewall, block volume, droplet, volume attachment and the apex A
//! record. Every step re-fetches the identifier recorded in the checkpoint
//! and only creates when the remote side reports it missing. New
//! identifiers are saved right after each create so an interrupted run picks
//! up where it stopped.

use crate::error::{DigitalOceanError, Result};
use crate::resources::{
    CreateDroplet, Droplet, ImageRef, action, domain, droplet, firewall, ssh_key, tag, volume,
};
use boxflow_cloud::{CloudApi, Deadline, Settings, poll_until};
use boxflow_config::{ProjectConfig, ProjectStore};
use boxflow_core::resource_name;

const NAMESERVERS: [&str; 3] = [
    "ns1.digitalocean.com",
    "ns2.digitalocean.com",
    "ns3.digitalocean.com",
];

/// What an ensure step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The recorded resource still exists
    Verified,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsOutcome {
    Unchanged,
    Created,
    /// A record pointing elsewhere was deleted and recreated
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub domain: Outcome,
    pub firewall: Outcome,
    pub volume: Outcome,
    pub droplet: Outcome,
    pub attachment: Outcome,
    pub dns: DnsOutcome,
}

pub struct RemoteProvisioner<A> {
    api: A,
    store: ProjectStore,
    settings: Settings,
}

impl<A: CloudApi> RemoteProvisioner<A> {
    pub fn new(api: A, store: ProjectStore, settings: Settings) -> Self {
        Self {
            api,
            store,
            settings,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run every step in order. The config is updated and saved as resources appear.
    pub async fn provision(&self, config: &mut ProjectConfig) -> Result<ProvisionReport> {
        let image_id = config.image_id.ok_or(DigitalOceanError::MissingBaseImage)?;
        let tag_name = resource_name(&config.project_name);

        tracing::info!("Provisioning remote environment for {}", config.project_name);
        tag::ensure(&self.api, &tag_name, self.settings.deadline()).await?;

        let domain = self.ensure_domain(config).await?;
        let firewall = self.ensure_firewall(config, &tag_name).await?;
        let (volume_id, volume) = self.ensure_volume(config).await?;
        let (droplet, droplet_outcome) = self.ensure_droplet(config, image_id, &tag_name).await?;
        let attachment = self
            .ensure_volume_attached(config, &volume_id, &droplet)
            .await?;
        let dns = self.reconcile_dns(config).await?;

        Ok(ProvisionReport {
            domain,
            firewall,
            volume,
            droplet: droplet_outcome,
            attachment,
            dns,
        })
    }

    /// The bare domain must be managed by DigitalOcean for the A record to resolve
    pub async fn ensure_domain(&self, config: &ProjectConfig) -> Result<Outcome> {
        let name = &config.bare_domain;
        match domain::get(&self.api, name, self.settings.deadline()).await {
            Ok(_) => {
                tracing::info!("Domain entry exists for {}", name);
                return Ok(Outcome::Verified);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        tracing::warn!(
            "Please ensure that your domain registrar points {} to DigitalOcean's nameservers: {}",
            name,
            NAMESERVERS.join(", ")
        );
        tracing::info!("Creating domain entry for {}", name);
        domain::create(&self.api, name, self.settings.deadline()).await?;
        Ok(Outcome::Created)
    }

    pub async fn ensure_firewall(
        &self,
        config: &mut ProjectConfig,
        tag_name: &str,
    ) -> Result<Outcome> {
        if let Some(id) = &config.firewall_id {
            tracing::info!("Verifying existing firewall {}", id);
            match firewall::get(&self.api, id, self.settings.deadline()).await {
                Ok(_) => return Ok(Outcome::Verified),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Firewall {} not found, creating a new one", id)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let name = resource_name(&config.project_name);
        tracing::info!("Creating firewall {}", name);
        let (inbound, outbound) = firewall::default_rules();
        let created = firewall::create(
            &self.api,
            &name,
            &inbound,
            &outbound,
            &[tag_name.to_string()],
            self.settings.deadline(),
        )
        .await?;

        config.firewall_id = Some(created.id);
        self.store.save(config)?;
        Ok(Outcome::Created)
    }

    /// Returns the volume id along with the outcome
    pub async fn ensure_volume(&self, config: &mut ProjectConfig) -> Result<(String, Outcome)> {
        if let Some(id) = &config.volume_id {
            tracing::info!("Verifying existing block storage volume {}", id);
            match volume::get(&self.api, id, self.settings.deadline()).await {
                Ok(existing) => return Ok((existing.id, Outcome::Verified)),
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Volume {} not found, creating a new one", id)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let name = resource_name(&config.project_name);
        tracing::info!(
            "Creating {} GiB block storage volume {}",
            config.volume_size,
            name
        );
        let created = volume::create(
            &self.api,
            &name,
            &config.region,
            config.volume_size,
            self.settings.deadline(),
        )
        .await?;

        config.volume_id = Some(created.id.clone());
        self.store.save(config)?;
        Ok((created.id, Outcome::Created))
    }

    /// Verify or create the droplet and wait until it is running
    pub async fn ensure_droplet(
        &self,
        config: &mut ProjectConfig,
        image_id: u64,
        tag_name: &str,
    ) -> Result<(Droplet, Outcome)> {
        let name = resource_name(&config.project_name);

        if let Some(id) = config.droplet_id {
            tracing::info!("Verifying existing droplet {}", id);
            match droplet::get(&self.api, id, self.settings.deadline()).await {
                Ok(existing) => {
                    let existing = if existing.status == droplet::STATUS_ACTIVE {
                        existing
                    } else {
                        self.wait_for_boot(id, &name).await?
                    };
                    self.record_address(config, &existing)?;
                    return Ok((existing, Outcome::Verified));
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Droplet {} not found, creating a new one", id)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let public_key_id = config
            .public_key_id
            .ok_or(DigitalOceanError::MissingPublicKey)?;
        let request = CreateDroplet {
            name: name.clone(),
            size: config.droplet_slug.clone(),
            region: config.region.clone(),
            image: ImageRef::Id(image_id),
            ssh_keys: vec![public_key_id],
            tags: vec![tag_name.to_string()],
        };

        tracing::info!("Creating droplet {}", name);
        let created = droplet::create(&self.api, &request, self.settings.deadline()).await?;
        config.droplet_id = Some(created.id);
        config.droplet_public_ip = None;
        self.store.save(config)?;

        let running = self.wait_for_boot(created.id, &name).await?;
        tracing::info!("Droplet {} is active", name);
        self.record_address(config, &running)?;
        Ok((running, Outcome::Created))
    }

    async fn wait_for_boot(&self, droplet_id: u64, name: &str) -> Result<Droplet> {
        let api = &self.api;
        let deadline = self.settings.deadline();
        let running = poll_until(
            "droplet to boot",
            name,
            self.settings.poll_interval,
            deadline,
            move || async move {
                droplet::get(api, droplet_id, deadline)
                    .await
                    .map(|d| d.boot_status())
            },
        )
        .await?;
        Ok(running)
    }

    fn record_address(&self, config: &mut ProjectConfig, droplet: &Droplet) -> Result<()> {
        let address = droplet
            .public_ipv4()
            .ok_or(DigitalOceanError::NoPublicAddress(droplet.id))?;
        if config.droplet_public_ip.as_deref() != Some(address) {
            config.droplet_public_ip = Some(address.to_string());
            self.store.save(config)?;
        }
        Ok(())
    }

    /// Attach the project volume unless the droplet already lists it
    pub async fn ensure_volume_attached(
        &self,
        config: &ProjectConfig,
        volume_id: &str,
        droplet: &Droplet,
    ) -> Result<Outcome> {
        if droplet.has_volume(volume_id) {
            tracing::info!("Block storage volume is already attached to the droplet");
            return Ok(Outcome::Verified);
        }

        tracing::info!("Attaching block storage volume {} to droplet {}", volume_id, droplet.id);
        let started = volume::attach(
            &self.api,
            volume_id,
            droplet.id,
            &config.region,
            self.settings.deadline(),
        )
        .await?;

        let api = &self.api;
        let deadline = self.settings.deadline();
        let action_id = started.id;
        poll_until(
            "volume attachment",
            volume_id,
            self.settings.poll_interval,
            deadline,
            move || async move {
                action::get(api, action_id, deadline)
                    .await
                    .map(|a| a.poll_status())
            },
        )
        .await?;

        tracing::info!("Block storage volume attached");
        Ok(Outcome::Created)
    }

    /// Point the apex A record at the droplet
    pub async fn reconcile_dns(&self, config: &ProjectConfig) -> Result<DnsOutcome> {
        let address = config
            .droplet_public_ip
            .as_deref()
            .ok_or(DigitalOceanError::NoPublicAddress(config.droplet_id.unwrap_or_default()))?;
        let domain_name = &config.bare_domain;

        let records =
            domain::list_records(&self.api, domain_name, Some("A"), self.settings.deadline())
                .await?;
        let apex = records.iter().find(|r| r.name == domain::APEX_RECORD);

        let outcome = match apex {
            Some(record) if record.data == address => {
                tracing::info!("Domain record for {} already points at {}", domain_name, address);
                return Ok(DnsOutcome::Unchanged);
            }
            Some(record) => {
                tracing::info!(
                    "Domain record for {} points at {}, replacing it",
                    domain_name,
                    record.data
                );
                domain::delete_record(&self.api, domain_name, record.id, self.settings.deadline())
                    .await?;
                DnsOutcome::Replaced
            }
            None => DnsOutcome::Created,
        };

        tracing::info!("Adding domain record {} -> {}", domain_name, address);
        domain::create_a_record(
            &self.api,
            domain_name,
            domain::APEX_RECORD,
            address,
            domain::DEFAULT_TTL,
            self.settings.deadline(),
        )
        .await?;
        Ok(outcome)
    }
}

/// Find the account key matching the local public key, registering it when absent.
///
/// Records the key id in `config`; the caller persists it.
pub async fn ensure_public_key<A: CloudApi + ?Sized>(
    api: &A,
    config: &mut ProjectConfig,
    deadline: Deadline,
) -> Result<u64> {
    let path = config.public_key_path();
    let public_key = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| DigitalOceanError::KeyUnreadable {
            path: path.clone(),
            source,
        })?;

    let keys = ssh_key::list(api, deadline).await?;
    let id = match keys.iter().find(|k| k.matches(&public_key)) {
        Some(existing) => {
            tracing::info!("Public key already registered as {}", existing.name);
            existing.id
        }
        None => {
            let name = format!("box-key-{}", config.project_name.to_lowercase());
            tracing::info!("Registering public key {} as {}", path.display(), name);
            ssh_key::create(api, &name, public_key.trim(), deadline).await?.id
        }
    };

    config.public_key_id = Some(id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, Method};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    const IP: &str = "203.0.113.10";

    fn settings() -> Settings {
        Settings {
            poll_interval: Duration::from_millis(1),
            poll_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn config() -> ProjectConfig {
        ProjectConfig {
            project_name: "shop".to_string(),
            region: "nyc3".to_string(),
            droplet_slug: "s-2vcpu-2gb".to_string(),
            volume_size: 1,
            bare_domain: "shop.io".to_string(),
            image_id: Some(7),
            public_key_id: Some(512190),
            ..ProjectConfig::new("shop")
        }
    }

    fn droplet_json(status: &str, volume_ids: &[&str]) -> serde_json::Value {
        json!({
            "droplet": {
                "id": 42,
                "name": "box-shop",
                "status": status,
                "volume_ids": volume_ids,
                "networks": {"v4": [{"ip_address": IP, "type": "public"}]},
            }
        })
    }

    fn a_record(data: &str) -> serde_json::Value {
        json!({"domain_records": [{"id": 9, "type": "A", "name": "@", "data": data}]})
    }

    fn provisioner(api: FakeApi, dir: &TempDir) -> RemoteProvisioner<FakeApi> {
        RemoteProvisioner::new(api, ProjectStore::new(dir.path()), settings())
    }

    #[tokio::test]
    async fn test_accurate_checkpoint_only_fetches() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.respond(Method::Get, "/tags/box-shop", json!({"tag": {"name": "box-shop"}}))
            .respond(Method::Get, "/domains/shop.io", json!({"domain": {"name": "shop.io"}}))
            .respond(Method::Get, "/firewalls/fw-1", json!({"firewall": {"id": "fw-1"}}))
            .respond(Method::Get, "/volumes/vol-1", json!({"volume": {"id": "vol-1"}}))
            .respond(Method::Get, "/droplets/42", droplet_json("active", &["vol-1"]))
            .respond(
                Method::Get,
                "/domains/shop.io/records?per_page=200&type=A",
                a_record(IP),
            );

        let mut config = ProjectConfig {
            firewall_id: Some("fw-1".to_string()),
            volume_id: Some("vol-1".to_string()),
            droplet_id: Some(42),
            droplet_public_ip: Some(IP.to_string()),
            ..config()
        };
        let before = config.clone();

        let provisioner = provisioner(api, &dir);
        let report = provisioner.provision(&mut config).await.unwrap();

        assert_eq!(
            report,
            ProvisionReport {
                domain: Outcome::Verified,
                firewall: Outcome::Verified,
                volume: Outcome::Verified,
                droplet: Outcome::Verified,
                attachment: Outcome::Verified,
                dns: DnsOutcome::Unchanged,
            }
        );
        assert_eq!(provisioner.api().mutations(), 0);
        assert_eq!(config, before);
    }

    #[tokio::test]
    async fn test_fresh_project_creates_everything_and_checkpoints() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.fail(Method::Get, "/tags/box-shop", 404, "not found")
            .respond(Method::Post, "/tags", json!({"tag": {"name": "box-shop"}}))
            .fail(Method::Get, "/domains/shop.io", 404, "not found")
            .respond(Method::Post, "/domains", json!({"domain": {"name": "shop.io"}}))
            .respond(Method::Post, "/firewalls", json!({"firewall": {"id": "fw-1"}}))
            .respond(Method::Post, "/volumes", json!({"volume": {"id": "vol-1"}}))
            .respond(Method::Post, "/droplets", json!({"droplet": {"id": 42, "status": "new"}}))
            .respond(Method::Get, "/droplets/42", droplet_json("new", &[]))
            .respond(Method::Get, "/droplets/42", droplet_json("active", &[]))
            .respond(
                Method::Post,
                "/volumes/vol-1/actions",
                json!({"action": {"id": 5, "status": "in-progress"}}),
            )
            .respond(Method::Get, "/actions/5", json!({"action": {"id": 5, "status": "in-progress"}}))
            .respond(Method::Get, "/actions/5", json!({"action": {"id": 5, "status": "completed"}}))
            .respond(
                Method::Get,
                "/domains/shop.io/records?per_page=200&type=A",
                json!({"domain_records": []}),
            )
            .respond(
                Method::Post,
                "/domains/shop.io/records",
                json!({"domain_record": {"id": 10, "type": "A", "name": "@", "data": IP}}),
            );

        let mut config = config();
        let provisioner = provisioner(api, &dir);
        let report = provisioner.provision(&mut config).await.unwrap();

        assert_eq!(report.domain, Outcome::Created);
        assert_eq!(report.firewall, Outcome::Created);
        assert_eq!(report.volume, Outcome::Created);
        assert_eq!(report.droplet, Outcome::Created);
        assert_eq!(report.attachment, Outcome::Created);
        assert_eq!(report.dns, DnsOutcome::Created);
        assert_eq!(provisioner.api().count_path(Method::Post, "/tags"), 1);

        let saved = ProjectStore::new(dir.path()).load("shop").unwrap();
        assert_eq!(saved.firewall_id.as_deref(), Some("fw-1"));
        assert_eq!(saved.volume_id.as_deref(), Some("vol-1"));
        assert_eq!(saved.droplet_id, Some(42));
        assert_eq!(saved.droplet_public_ip.as_deref(), Some(IP));

        let calls = provisioner.api().calls();
        let create = calls
            .iter()
            .find(|c| c.method == Method::Post && c.path == "/droplets")
            .unwrap();
        let body = create.body.as_ref().unwrap();
        assert_eq!(body["image"], 7);
        assert_eq!(body["tags"][0], "box-shop");
        let firewall = calls
            .iter()
            .find(|c| c.method == Method::Post && c.path == "/firewalls")
            .unwrap();
        assert_eq!(firewall.body.as_ref().unwrap()["tags"][0], "box-shop");
    }

    #[tokio::test]
    async fn test_missing_base_image() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig {
            image_id: None,
            ..config()
        };
        let provisioner = provisioner(FakeApi::new(), &dir);
        let err = provisioner.provision(&mut config).await.unwrap_err();

        assert!(matches!(err, DigitalOceanError::MissingBaseImage));
        assert!(provisioner.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_recorded_firewall_gone_is_recreated() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.fail(Method::Get, "/firewalls/fw-old", 404, "not found")
            .respond(Method::Post, "/firewalls", json!({"firewall": {"id": "fw-new"}}));

        let mut config = ProjectConfig {
            firewall_id: Some("fw-old".to_string()),
            ..config()
        };
        let provisioner = provisioner(api, &dir);
        let outcome = provisioner
            .ensure_firewall(&mut config, "box-shop")
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Created);
        assert_eq!(config.firewall_id.as_deref(), Some("fw-new"));
    }

    #[tokio::test]
    async fn test_verify_error_other_than_not_found_is_fatal() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.fail(Method::Get, "/volumes/vol-1", 401, "Unable to authenticate you");

        let mut config = ProjectConfig {
            volume_id: Some("vol-1".to_string()),
            ..config()
        };
        let provisioner = provisioner(api, &dir);
        let err = provisioner.ensure_volume(&mut config).await.unwrap_err();

        assert!(err.to_string().contains("Unable to authenticate you"));
        assert_eq!(provisioner.api().mutations(), 0);
    }

    #[tokio::test]
    async fn test_droplet_unexpected_state_names_resource() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.respond(Method::Post, "/droplets", json!({"droplet": {"id": 42, "status": "new"}}))
            .respond(Method::Get, "/droplets/42", droplet_json("archive", &[]));

        let mut config = config();
        let provisioner = provisioner(api, &dir);
        let err = provisioner
            .ensure_droplet(&mut config, 7, "box-shop")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("box-shop"));
        // The id was checkpointed before polling started
        assert_eq!(config.droplet_id, Some(42));
    }

    #[tokio::test]
    async fn test_dns_mismatch_deletes_then_creates() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.respond(
            Method::Get,
            "/domains/shop.io/records?per_page=200&type=A",
            a_record("198.51.100.1"),
        )
        .respond(Method::Delete, "/domains/shop.io/records/9", json!(null))
        .respond(
            Method::Post,
            "/domains/shop.io/records",
            json!({"domain_record": {"id": 10, "type": "A", "name": "@", "data": IP}}),
        );

        let config = ProjectConfig {
            droplet_id: Some(42),
            droplet_public_ip: Some(IP.to_string()),
            ..config()
        };
        let provisioner = provisioner(api, &dir);
        let outcome = provisioner.reconcile_dns(&config).await.unwrap();

        assert_eq!(outcome, DnsOutcome::Replaced);
        assert_eq!(provisioner.api().count(Method::Delete), 1);
        assert_eq!(provisioner.api().count(Method::Post), 1);

        let calls = provisioner.api().calls();
        let body = calls.last().unwrap().body.as_ref().unwrap();
        assert_eq!(body["data"], IP);
        assert_eq!(body["ttl"], 1800);
    }

    #[tokio::test]
    async fn test_dns_match_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::new();
        api.respond(
            Method::Get,
            "/domains/shop.io/records?per_page=200&type=A",
            a_record(IP),
        );

        let config = ProjectConfig {
            droplet_public_ip: Some(IP.to_string()),
            ..config()
        };
        let provisioner = provisioner(api, &dir);
        let outcome = provisioner.reconcile_dns(&config).await.unwrap();

        assert_eq!(outcome, DnsOutcome::Unchanged);
        assert_eq!(provisioner.api().mutations(), 0);
    }

    #[tokio::test]
    async fn test_ensure_public_key_reuses_registered_key() {
        let dir = TempDir::new().unwrap();
        let key = dir.path().join("id_rsa");
        std::fs::write(dir.path().join("id_rsa.pub"), "ssh-rsa AAAAB3Nza dev@laptop\n").unwrap();

        let api = FakeApi::new();
        api.respond(
            Method::Get,
            "/account/keys?per_page=200",
            json!({"ssh_keys": [
                {"id": 1, "name": "other", "public_key": "ssh-rsa AAAAOTHER x"},
                {"id": 2, "name": "laptop", "public_key": "ssh-rsa AAAAB3Nza dev@laptop"}
            ]}),
        );

        let mut config = ProjectConfig {
            private_key_path: key,
            public_key_id: None,
            ..config()
        };
        let id = ensure_public_key(&api, &mut config, settings().deadline())
            .await
            .unwrap();

        assert_eq!(id, 2);
        assert_eq!(config.public_key_id, Some(2));
        assert_eq!(api.mutations(), 0);
    }

    #[tokio::test]
    async fn test_ensure_public_key_registers_new_key() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("id_rsa.pub"), "ssh-rsa AAAAB3Nza dev@laptop\n").unwrap();

        let api = FakeApi::new();
        api.respond(Method::Get, "/account/keys?per_page=200", json!({"ssh_keys": []}))
            .respond(
                Method::Post,
                "/account/keys",
                json!({"ssh_key": {"id": 512190, "name": "box-key-shop", "public_key": "ssh-rsa AAAAB3Nza dev@laptop"}}),
            );

        let mut config = ProjectConfig {
            private_key_path: dir.path().join("id_rsa"),
            public_key_id: None,
            ..config()
        };
        let id = ensure_public_key(&api, &mut config, settings().deadline())
            .await
            .unwrap();

        assert_eq!(id, 512190);
        let calls = api.calls();
        let body = calls.last().unwrap().body.as_ref().unwrap();
        assert_eq!(body["name"], "box-key-shop");
        assert_eq!(body["public_key"], "ssh-rsa AAAAB3Nza dev@laptop");
    }

    #[tokio::test]
    async fn test_ensure_public_key_unreadable() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig {
            private_key_path: dir.path().join("missing"),
            ..config()
        };
        let api = FakeApi::new();
        let err = ensure_public_key(&api, &mut config, settings().deadline())
            .await
            .unwrap_err();

        assert!(matches!(err, DigitalOceanError::KeyUnreadable { .. }));
        assert!(api.calls().is_empty());
    }
}
