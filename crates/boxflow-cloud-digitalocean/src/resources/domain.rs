use boxflow_cloud::{CloudApi, Deadline, Result, delete as delete_path, get_json, post_json};
use serde::{Deserialize, Serialize};

/// Name of the record that points at the bare domain
pub const APEX_RECORD: &str = "@";
pub const DEFAULT_TTL: u32 = 1800;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Domain {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DomainRecord {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Serialize)]
struct CreateRecord<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
    data: &'a str,
    ttl: u32,
}

#[derive(Deserialize)]
struct DomainEnvelope {
    domain: Domain,
}

#[derive(Deserialize)]
struct RecordEnvelope {
    domain_record: DomainRecord,
}

#[derive(Deserialize)]
struct RecordList {
    #[serde(default)]
    domain_records: Vec<DomainRecord>,
}

pub async fn get<A: CloudApi + ?Sized>(api: &A, name: &str, deadline: Deadline) -> Result<Domain> {
    let envelope: DomainEnvelope = get_json(api, &format!("/domains/{}", name), deadline).await?;
    Ok(envelope.domain)
}

pub async fn create<A: CloudApi + ?Sized>(
    api: &A,
    name: &str,
    deadline: Deadline,
) -> Result<Domain> {
    let body = serde_json::json!({ "name": name });
    let envelope: DomainEnvelope = post_json(api, "/domains", &body, deadline).await?;
    Ok(envelope.domain)
}

/// Records of the domain, optionally restricted to one record type
pub async fn list_records<A: CloudApi + ?Sized>(
    api: &A,
    domain: &str,
    kind: Option<&str>,
    deadline: Deadline,
) -> Result<Vec<DomainRecord>> {
    let mut path = format!("/domains/{}/records?per_page=200", domain);
    if let Some(kind) = kind {
        path.push_str(&format!("&type={}", kind));
    }
    let list: RecordList = get_json(api, &path, deadline).await?;
    Ok(list.domain_records)
}

pub async fn delete_record<A: CloudApi + ?Sized>(
    api: &A,
    domain: &str,
    record_id: u64,
    deadline: Deadline,
) -> Result<()> {
    delete_path(api, &format!("/domains/{}/records/{}", domain, record_id), deadline).await
}

pub async fn create_a_record<A: CloudApi + ?Sized>(
    api: &A,
    domain: &str,
    name: &str,
    address: &str,
    ttl: u32,
    deadline: Deadline,
) -> Result<DomainRecord> {
    let body = CreateRecord {
        kind: "A",
        name,
        data: address,
        ttl,
    };
    let envelope: RecordEnvelope =
        post_json(api, &format!("/domains/{}/records", domain), &body, deadline).await?;
    Ok(envelope.domain_record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_records() {
        let json = r#"{
            "domain_records": [
                {"id": 28448429, "type": "NS", "name": "@", "data": "ns1.digitalocean.com", "ttl": 1800},
                {"id": 28448432, "type": "A", "name": "@", "data": "203.0.113.10", "ttl": 1800}
            ],
            "links": {},
            "meta": {"total": 2}
        }"#;
        let list: RecordList = serde_json::from_str(json).unwrap();
        assert_eq!(list.domain_records.len(), 2);
        assert_eq!(list.domain_records[1].kind, "A");
        assert_eq!(list.domain_records[1].data, "203.0.113.10");
    }

    #[test]
    fn test_create_record_body() {
        let body = serde_json::to_value(CreateRecord {
            kind: "A",
            name: APEX_RECORD,
            data: "203.0.113.10",
            ttl: DEFAULT_TTL,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"type": "A", "name": "@", "data": "203.0.113.10", "ttl": 1800})
        );
    }
}
