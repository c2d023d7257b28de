//! REST API abstraction

use crate::deadline::Deadline;
use crate::error::{ApiError, ApiErrorKind, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Minimal REST surface used by the provisioning pipelines.
///
/// Paths are relative to the provider's API root, e.g. `/droplets/42`.
/// Every call is bounded by the given deadline.
#[async_trait]
pub trait CloudApi: Send + Sync {
    async fn get(&self, path: &str, deadline: Deadline) -> std::result::Result<Vec<u8>, ApiError>;

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        deadline: Deadline,
    ) -> std::result::Result<Vec<u8>, ApiError>;

    async fn delete(&self, path: &str, deadline: Deadline) -> std::result::Result<(), ApiError>;
}

fn decode<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> std::result::Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| {
        ApiError::new(
            ApiErrorKind::Decode,
            None,
            format!("unexpected response from {}: {}", path, e),
        )
    })
}

/// GET and decode a JSON body
pub async fn get_json<T, A>(api: &A, path: &str, deadline: Deadline) -> Result<T>
where
    T: DeserializeOwned,
    A: CloudApi + ?Sized,
{
    tracing::debug!("GET {}", path);
    let bytes = api.get(path, deadline).await?;
    Ok(decode(path, &bytes)?)
}

/// POST a JSON body and decode the JSON response
pub async fn post_json<T, B, A>(api: &A, path: &str, body: &B, deadline: Deadline) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
    A: CloudApi + ?Sized,
{
    tracing::debug!("POST {}", path);
    let body = serde_json::to_value(body)?;
    let bytes = api.post(path, &body, deadline).await?;
    Ok(decode(path, &bytes)?)
}

pub async fn delete<A>(api: &A, path: &str, deadline: Deadline) -> Result<()>
where
    A: CloudApi + ?Sized,
{
    tracing::debug!("DELETE {}", path);
    Ok(api.delete(path, deadline).await?)
}
