//! Fixed-content checks against paths that should always resolve.

use async_trait::async_trait;
use prometheus::Histogram;
use tracing::warn;

use super::latency_histogram;
use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};

/// Fetches a set of well-known content paths and compares each response
/// against its expected bytes.
pub struct KnownGoodCheck {
    id: ProbeId,
    schedule: String,
    checks: Vec<(String, Vec<u8>)>,
    ttfb: Histogram,
    fetch_time: Histogram,
}

impl KnownGoodCheck {
    /// `checks` maps content paths (e.g. `/ipfs/Qm...`) to expected bodies.
    pub fn new(schedule: &str, checks: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            checks,
            ttfb: latency_histogram(
                "known_good",
                "fetch_ttfb_ms",
                "Milliseconds until first byte from the gateway",
                None,
            ),
            fetch_time: latency_histogram(
                "known_good",
                "fetch_time_ms",
                "Milliseconds for the full gateway download",
                None,
            ),
        }
    }
}

#[async_trait]
impl Probe for KnownGoodCheck {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, deps: &ProbeDeps) -> Result<(), ProbeError> {
        for (path, expected) in &self.checks {
            let outcome = deps.gateway.fetch(path).await?;
            self.ttfb.observe(outcome.ttfb_ms);
            self.fetch_time.observe(outcome.total_ms);

            if &outcome.body != expected {
                let url = deps.gateway.url_for(path);
                warn!(%url, "response from gateway did not match");
                return Err(ProbeError::Mismatch { url });
            }
        }
        Ok(())
    }

    fn registration(&self) -> Registration {
        Registration {
            schedule: self.schedule.clone(),
            collectors: vec![Box::new(self.ttfb.clone()), Box::new(self.fetch_time.clone())],
        }
    }
}
