use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{StorageError, StorageResult};

/// Content-addressed store: hand it bytes, get back an opaque identifier
/// derived from them.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, data: Vec<u8>) -> StorageResult<String>;
}

/// Client for the IPFS HTTP API (`/api/v0/add`).
pub struct IpfsClient {
    http: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl IpfsClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    fn add_endpoint(&self) -> String {
        format!("{}/api/v0/add", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ContentStore for IpfsClient {
    async fn put(&self, data: Vec<u8>) -> StorageResult<String> {
        let part = reqwest::multipart::Part::bytes(data).file_name("blob");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.add_endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::ContentStore(format!("add request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::ContentStore(format!(
                "add returned status {status}"
            )));
        }

        let body: AddResponse = response
            .json()
            .await
            .map_err(|e| StorageError::ContentStore(format!("invalid add response: {e}")))?;

        debug!("Content store accepted blob as {}", body.hash);
        Ok(body.hash)
    }
}

#[cfg(test)]
mod content_tests {
    use super::*;

    #[test]
    fn add_response_parses_ipfs_shape() {
        let body = r#"{"Name":"blob","Hash":"QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG","Size":"42"}"#;
        let parsed: AddResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.hash.starts_with("Qm"));
    }

    #[test]
    fn add_endpoint_normalizes_trailing_slash() {
        let a = IpfsClient::new("http://127.0.0.1:5001");
        let b = IpfsClient::new("http://127.0.0.1:5001/");
        assert_eq!(a.add_endpoint(), "http://127.0.0.1:5001/api/v0/add");
        assert_eq!(a.add_endpoint(), b.add_endpoint());
    }
}
