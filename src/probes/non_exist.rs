//! Negative lookup: a freshly generated random CID must 404.

use async_trait::async_trait;
use cid::multihash::Multihash;
use cid::Cid;
use prometheus::{Histogram, IntCounter};
use tracing::{info, warn};

use super::{latency_histogram, probe_counter, random_bytes};
use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};

// Multicodec table entries: raw block, sha2-256.
const RAW_CODEC: u64 = 0x55;
const SHA2_256: u64 = 0x12;

/// Fetches a CID that cannot exist and expects the gateway to say 404
/// rather than hang or 5xx.
pub struct NonExistCheck {
    id: ProbeId,
    schedule: String,
    ttfb: Histogram,
    fetch_time: Histogram,
    fails: IntCounter,
    errors: IntCounter,
}

impl NonExistCheck {
    pub fn new(schedule: &str) -> Self {
        Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            ttfb: latency_histogram(
                "non_exist",
                "fetch_ttfb_ms",
                "Milliseconds until first byte from the gateway",
                None,
            ),
            fetch_time: latency_histogram(
                "non_exist",
                "fetch_time_ms",
                "Milliseconds until the gateway finished responding",
                None,
            ),
            fails: probe_counter(
                "non_exist",
                "fail_total",
                "Responses that were not the expected 404",
                None,
            ),
            errors: probe_counter(
                "non_exist",
                "error_total",
                "Errors before the status could be checked",
                None,
            ),
        }
    }

    /// A syntactically valid CIDv1 over a random digest. The digest is
    /// random, not a hash of anything, so no gateway can have the content.
    fn random_cid() -> Result<Cid, ProbeError> {
        let digest = random_bytes(32);
        let hash = Multihash::<64>::wrap(SHA2_256, &digest)
            .map_err(|e| ProbeError::Cid(e.to_string()))?;
        Ok(Cid::new_v1(RAW_CODEC, hash))
    }
}

#[async_trait]
impl Probe for NonExistCheck {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, deps: &ProbeDeps) -> Result<(), ProbeError> {
        let cid = Self::random_cid().map_err(|err| {
            self.errors.inc();
            err
        })?;
        info!(%cid, "generated random cid");

        let path = format!("/ipfs/{cid}");
        let outcome = deps.gateway.fetch(&path).await.map_err(|err| {
            self.errors.inc();
            err
        })?;
        self.ttfb.observe(outcome.ttfb_ms);
        self.fetch_time.observe(outcome.total_ms);

        if outcome.status != 404 {
            let url = deps.gateway.url_for(&path);
            warn!(%url, status = outcome.status, "expected a 404 from the gateway");
            self.fails.inc();
            return Err(ProbeError::UnexpectedStatus {
                url,
                got: outcome.status,
                expected: 404,
            });
        }
        Ok(())
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
