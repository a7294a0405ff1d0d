//! Benchmark through a remote pinning service.
//!
//! Adds random content locally, asks the pinning service to pin it, waits
//! for the pin to land, drops the local copy, and then fetches through the
//! gateway so the bytes must come from the pinning provider.

use std::time::Duration;

use async_trait::async_trait;
use prometheus::{Histogram, IntCounter};
use tracing::{info, warn};

use super::{latency_histogram, probe_counter, random_bytes};
use crate::clients::PinState;
use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};

/// How often to re-check pin status. The dispatcher's execution ceiling
/// bounds the overall wait.
const PIN_POLL_INTERVAL: Duration = Duration::from_secs(60);

pub struct RandomPinningBench {
    id: ProbeId,
    schedule: String,
    size: usize,
    ttfb: Histogram,
    fetch_time: Histogram,
    fails: IntCounter,
    errors: IntCounter,
}

impl RandomPinningBench {
    pub fn new(schedule: &str, size: usize) -> Self {
        Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            size,
            ttfb: latency_histogram(
                "random_pinning",
                "fetch_ttfb_ms",
                "Milliseconds until first byte from the gateway",
                Some(size),
            ),
            fetch_time: latency_histogram(
                "random_pinning",
                "fetch_time_ms",
                "Milliseconds for the full gateway download",
                Some(size),
            ),
            fails: probe_counter(
                "random_pinning",
                "fail_total",
                "Gateway responses that did not match the pinned content",
                Some(size),
            ),
            errors: probe_counter(
                "random_pinning",
                "error_total",
                "Errors before the content comparison could happen",
                Some(size),
            ),
        }
    }

    async fn pin_and_fetch(
        &self,
        deps: &ProbeDeps,
        cid: &str,
        expected: &[u8],
    ) -> Result<(), ProbeError> {
        let pinner = deps.pinner.as_ref().ok_or(ProbeError::NoPinningService)?;

        let request = pinner.add(cid).await.map_err(|err| {
            self.errors.inc();
            err
        })?;

        info!(requestid = %request.requestid, "waiting for pinning service to complete the pin");
        let mut status = request;
        while status.status != PinState::Pinned {
            if status.status == PinState::Failed {
                self.errors.inc();
                return Err(ProbeError::PinFailed {
                    requestid: status.requestid,
                });
            }
            tokio::time::sleep(PIN_POLL_INTERVAL).await;
            status = pinner.status(&status.requestid).await.map_err(|err| {
                self.errors.inc();
                err
            })?;
        }

        // Drop the local copy so the gateway has to hit the provider.
        info!(%cid, "removing pin from local ipfs node");
        deps.ipfs.pin_rm(cid).await.map_err(|err| {
            self.errors.inc();
            err
        })?;

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

        if let Err(err) = pinner.remove(&status.requestid).await {
            warn!(requestid = %status.requestid, error = %err, "failed to remove pin request");
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for RandomPinningBench {
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

        let result = self.pin_and_fetch(deps, &cid, &data).await;

        // Best-effort: the happy path already unpinned the local copy.
        let _ = deps.ipfs.pin_rm(&cid).await;

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
