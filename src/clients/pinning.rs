//! Client for an IPFS Pinning Service API endpoint.
//!
//! Implements the small slice of that API the pinning benchmark needs:
//! create a pin, poll its status, and delete it again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ClientError;

const SERVICE: &str = "pinning service";

/// Lifecycle states a pin request moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    Queued,
    Pinning,
    Pinned,
    Failed,
}

/// Status of one pin request.
#[derive(Debug, Clone, Deserialize)]
pub struct PinStatus {
    /// Service-assigned identifier for the request.
    pub requestid: String,
    pub status: PinState,
}

#[derive(Debug, Serialize)]
struct PinBody<'a> {
    cid: &'a str,
    name: &'a str,
}

/// HTTP client for a single pinning service.
#[derive(Debug, Clone)]
pub struct PinningClient {
    base: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl PinningClient {
    /// Create a client for a pinning service endpoint, with an optional
    /// bearer token.
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            token,
            http: reqwest::Client::new(),
        }
    }

    /// Ask the service to pin a CID.
    pub async fn add(&self, cid: &str) -> Result<PinStatus, ClientError> {
        let body = PinBody { cid, name: "gwmon" };
        let request = self.http.post(format!("{}/pins", self.base)).json(&body);
        let response = self.authorized(request).send().await?;
        let response = Self::check_status("pins", response)?;
        let status: PinStatus = response.json().await?;
        debug!(requestid = %status.requestid, "created pin request");
        Ok(status)
    }

    /// Fetch the current status of a pin request.
    pub async fn status(&self, requestid: &str) -> Result<PinStatus, ClientError> {
        let request = self
            .http
            .get(format!("{}/pins/{}", self.base, requestid));
        let response = self.authorized(request).send().await?;
        let response = Self::check_status("pins/{id}", response)?;
        Ok(response.json().await?)
    }

    /// Delete a pin request.
    pub async fn remove(&self, requestid: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .delete(format!("{}/pins/{}", self.base, requestid));
        let response = self.authorized(request).send().await?;
        Self::check_status("pins/{id}", response)?;
        Ok(())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
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
