//! Minimal client for the IPFS HTTP RPC API (`/api/v0`).
//!
//! Covers only the operations probes need: adding content, removing pins,
//! key management, and IPNS publishing. All RPC calls are POSTs, per the
//! API convention.

use serde::Deserialize;
use tracing::debug;

use super::ClientError;

const SERVICE: &str = "ipfs api";

/// A key known to the IPFS node.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyInfo {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "Name")]
    name: String,
}

/// HTTP client for a single IPFS node's RPC endpoint.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    base: String,
    http: reqwest::Client,
}

impl IpfsClient {
    /// Create a client for the given API endpoint, e.g. `http://127.0.0.1:5001`.
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    /// The API base URL without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Add a block of content, returning its CID string.
    pub async fn add(&self, data: Vec<u8>) -> Result<String, ClientError> {
        let part = reqwest::multipart::Part::bytes(data).file_name("data");
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(format!("{}/api/v0/add", self.base))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check_status("add", response)?;
        let parsed: AddResponse = response.json().await?;
        debug!(cid = %parsed.hash, "added content to ipfs node");
        Ok(parsed.hash)
    }

    /// Remove a pin so the node can garbage-collect the content.
    pub async fn pin_rm(&self, cid: &str) -> Result<(), ClientError> {
        self.rpc("pin/rm", &[("arg", cid)]).await?;
        Ok(())
    }

    /// Generate a named ed25519 key for IPNS publishing.
    pub async fn key_gen(&self, name: &str) -> Result<KeyInfo, ClientError> {
        let response = self
            .rpc("key/gen", &[("arg", name), ("type", "ed25519")])
            .await?;
        Ok(response.json().await?)
    }

    /// Remove a previously generated key.
    pub async fn key_rm(&self, name: &str) -> Result<(), ClientError> {
        self.rpc("key/rm", &[("arg", name)]).await?;
        Ok(())
    }

    /// Publish an IPNS record pointing at a CID, returning the IPNS name.
    pub async fn name_publish(
        &self,
        cid: &str,
        key: &str,
        lifetime: &str,
    ) -> Result<String, ClientError> {
        let arg = format!("/ipfs/{cid}");
        let response = self
            .rpc(
                "name/publish",
                &[("arg", &arg), ("key", key), ("lifetime", lifetime)],
            )
            .await?;
        let parsed: PublishResponse = response.json().await?;
        Ok(parsed.name)
    }

    async fn rpc(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}/api/v0/{}", self.base, endpoint);
        let response = self.http.post(&url).query(query).send().await?;
        Self::check_status(endpoint, response)
    }

    fn check_status(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        if !response.status().is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}
