//! Round-trip benchmark through the local IPFS node.
//!
//! Adds random content to the local node, fetches it back through the
//! gateway, compares the bytes, and unpins afterwards so the node can
//! garbage-collect.

use async_trait::async_trait;
use prometheus::{Histogram, IntCounter};
use tracing::{info, warn};

use super::{latency_histogram, probe_counter, random_bytes};
use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};

pub struct RandomLocalBench {
    id: ProbeId,
    schedule: String,
    size: usize,
    ttfb: Histogram,
    fetch_time: Histogram,
    fails: IntCounter,
    errors: IntCounter,
}

impl RandomLocalBench {
    pub fn new(schedule: &str, size: usize) -> Self {
        Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            size,
            ttfb: latency_histogram(
                "random_local",
                "fetch_ttfb_ms",
                "Milliseconds until first byte from the gateway",
                Some(size),
            ),
            fetch_time: latency_histogram(
                "random_local",
                "fetch_time_ms",
                "Milliseconds for the full gateway download",
                Some(size),
            ),
            fails: probe_counter(
                "random_local",
                "fail_total",
                "Gateway responses that did not match the published content",
                Some(size),
            ),
            errors: probe_counter(
                "random_local",
                "error_total",
                "Errors before the content comparison could happen",
                Some(size),
            ),
        }
    }

    async fn fetch_and_compare(
        &self,
        deps: &ProbeDeps,
        cid: &str,
        expected: &[u8],
    ) -> Result<(), ProbeError> {
        let path = format!("/ipfs/{cid}");
        let outcome = deps.gateway.fetch(&path).await.map_err(|err| {
            self.errors.inc();
            err
        })?;
        self.ttfb.observe(outcome.ttfb_ms);
        self.fetch_time.observe(outcome.total_ms);

        if outcome.body != expected {
            let url = deps.gateway.url_for(&path);
            warn!(%url, "response from gateway did not match");
            self.fails.inc();
            return Err(ProbeError::Mismatch { url });
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for RandomLocalBench {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, deps: &ProbeDeps) -> Result<(), ProbeError> {
        info!(size = self.size, "generating random data");
        let data = random_bytes(self.size);

        info!("writing data to local ipfs node");
        let cid = deps.ipfs.add(data.clone()).await.map_err(|err| {
            self.errors.inc();
            err
        })?;

        let result = self.fetch_and_compare(deps, &cid, &data).await;

        // Cleanup happens whether or not the fetch succeeded.
        info!(%cid, "cleaning up ipfs node");
        if let Err(err) = deps.ipfs.pin_rm(&cid).await {
            warn!(%cid, error = %err, "failed to unpin test content");
            self.errors.inc();
        }

        result
    }

    fn registration(&self) -> Registration {
        Registration {
            schedule: self.schedule.clone(),
            collectors: vec![
                Box::new(self.ttfb.clone()),
                Box::new(self.fetch_time.clone()),
                Box::new(self.fails.clone()),
                Box::new(self.errors.clone()),
            ],
        }
    }
}
