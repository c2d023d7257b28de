//! DigitalOcean REST client
//!
//! Bearer-token client for `https://api.digitalocean.com/v2`. Failed calls
//! surface the `message` field of the error body.

use async_trait::async_trait;
use boxflow_cloud::{ApiError, ApiErrorKind, CloudApi, Deadline};
use serde::Deserialize;

pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2";

/// Environment variable read by `box init`
pub const TOKEN_ENV: &str = "DIGITALOCEAN_TOKEN";

pub struct DigitalOceanClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Message from an error response body, falling back to a generic one
fn error_message(body: &[u8], url: &str) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("An API error occurred at {}", url))
}

fn transport_error(err: reqwest::Error) -> ApiError {
    let kind = if err.is_timeout() {
        ApiErrorKind::Timeout
    } else {
        ApiErrorKind::Transport
    };
    ApiError::new(kind, err.status().map(|s| s.as_u16()), err.to_string())
}

impl DigitalOceanClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token: api_token.into(),
            base_url: DIGITALOCEAN_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        deadline: Deadline,
    ) -> Result<Vec<u8>, ApiError> {
        if deadline.is_expired() {
            return Err(ApiError::new(
                ApiErrorKind::Timeout,
                None,
                format!("deadline passed before calling {}", url),
            ));
        }

        let response = request
            .bearer_auth(&self.api_token)
            .timeout(deadline.remaining())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ApiError::from_status(
                status.as_u16(),
                error_message(&body, url),
            ));
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl CloudApi for DigitalOceanClient {
    async fn get(&self, path: &str, deadline: Deadline) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        self.send(self.client.get(&url), &url, deadline).await
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
        deadline: Deadline,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        self.send(self.client.post(&url).json(body), &url, deadline)
            .await
    }

    async fn delete(&self, path: &str, deadline: Deadline) -> Result<(), ApiError> {
        let url = self.url(path);
        self.send(self.client.delete(&url), &url, deadline)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_message_from_body() {
        let body = br#"{"id":"not_found","message":"The resource you were accessing could not be found."}"#;
        assert_eq!(
            error_message(body, "https://api.digitalocean.com/v2/droplets/1"),
            "The resource you were accessing could not be found."
        );
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(
            error_message(b"<html>bad gateway</html>", "https://x/v2/domains"),
            "An API error occurred at https://x/v2/domains"
        );
        assert_eq!(
            error_message(br#"{"message":""}"#, "https://x/v2/domains"),
            "An API error occurred at https://x/v2/domains"
        );
    }

    #[test]
    fn test_base_url() {
        let client = DigitalOceanClient::new("token").with_base_url("http://localhost:9000/v2/");
        assert_eq!(client.url("/droplets/42"), "http://localhost:9000/v2/droplets/42");
        assert_eq!(
            DigitalOceanClient::new("token").url("/account/keys"),
            "https://api.digitalocean.com/v2/account/keys"
        );
    }

    #[tokio::test]
    async fn test_expired_deadline_short_circuits() {
        let client = DigitalOceanClient::new("token").with_base_url("http://127.0.0.1:9");
        let err = client
            .get("/droplets", Deadline::after(Duration::ZERO))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Timeout);
    }
}
