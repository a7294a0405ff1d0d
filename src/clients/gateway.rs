//! Client for the gateway endpoint under test.
//!
//! Fetches record time-to-first-byte (headers received) and total download
//! time so probes can feed their latency histograms. Non-success statuses
//! are returned in the outcome, not as errors: some probes expect a 404.

use std::time::Instant;

use tracing::{debug, info};

use super::ClientError;

/// Result of a single timed gateway fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    /// HTTP status code.
    pub status: u16,
    /// Full response body.
    pub body: Vec<u8>,
    /// Milliseconds until response headers arrived.
    pub ttfb_ms: f64,
    /// Milliseconds until the body was fully downloaded.
    pub total_ms: f64,
}

/// HTTP client bound to one gateway base URL.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base: String,
    http: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for the given base URL, e.g. `https://ipfs.io`.
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

    /// The gateway base URL without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Full URL for a content path like `/ipfs/{cid}`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Fetch a content path, timing first byte and full download.
    pub async fn fetch(&self, path: &str) -> Result<FetchOutcome, ClientError> {
        let url = self.url_for(path);
        info!(%url, "fetching from gateway");

        let start = Instant::now();
        let response = self.http.get(&url).send().await?;
        let ttfb_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(ms = ttfb_ms, "first byte received");

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        let total_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(ms = total_ms, bytes = body.len(), "finished download");

        Ok(FetchOutcome {
            status,
            body,
            ttfb_ms,
            total_ms,
        })
    }
}
