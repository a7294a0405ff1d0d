//! IPNS publish-and-resolve benchmark.
//!
//! Publishes random content under a throwaway key, resolves it through the
//! gateway's `/ipns/` path, and times both the publish and the fetch.

use std::time::Instant;

use async_trait::async_trait;
use prometheus::Histogram;
use tracing::{info, warn};
use uuid::Uuid;

use super::{latency_histogram, random_bytes};
use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};

const RECORD_LIFETIME: &str = "1h";

pub struct IpnsBench {
    id: ProbeId,
    schedule: String,
    size: usize,
    publish_time: Histogram,
    ttfb: Histogram,
    fetch_time: Histogram,
}

impl IpnsBench {
    pub fn new(schedule: &str, size: usize) -> Self {
        Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            size,
            publish_time: latency_histogram(
                "ipns",
                "publish_ms",
                "Milliseconds to publish the IPNS record",
                Some(size),
            ),
            ttfb: latency_histogram(
                "ipns",
                "fetch_ttfb_ms",
                "Milliseconds until first byte from the gateway",
                Some(size),
            ),
            fetch_time: latency_histogram(
                "ipns",
                "fetch_time_ms",
                "Milliseconds for the full gateway download",
                Some(size),
            ),
        }
    }

    async fn publish_and_fetch(
        &self,
        deps: &ProbeDeps,
        cid: &str,
        key_name: &str,
        expected: &[u8],
    ) -> Result<(), ProbeError> {
        let publish_start = Instant::now();
        let name = deps
            .ipfs
            .name_publish(cid, key_name, RECORD_LIFETIME)
            .await?;
        let publish_ms = publish_start.elapsed().as_secs_f64() * 1000.0;
        info!(ms = publish_ms, %cid, ipns = %name, "published ipns record");
        self.publish_time.observe(publish_ms);

        let path = format!("/ipns/{name}");
        let outcome = deps.gateway.fetch(&path).await?;
        self.ttfb.observe(outcome.ttfb_ms);
        self.fetch_time.observe(outcome.total_ms);

        if outcome.body != expected {
            let url = deps.gateway.url_for(&path);
            warn!(%url, "response from gateway did not match");
            return Err(ProbeError::Mismatch { url });
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for IpnsBench {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, deps: &ProbeDeps) -> Result<(), ProbeError> {
        info!(size = self.size, "generating random data");
        let data = random_bytes(self.size);

        info!("writing data to local ipfs node");
        let cid = deps.ipfs.add(data.clone()).await?;

        // Throwaway key per run; removed again below.
        let key_name = format!("gwmon-{}", Uuid::new_v4().simple());
        let result = match deps.ipfs.key_gen(&key_name).await {
            Ok(_) => {
                let result = self.publish_and_fetch(deps, &cid, &key_name, &data).await;
                if let Err(err) = deps.ipfs.key_rm(&key_name).await {
                    warn!(key = %key_name, error = %err, "failed to remove ipns key");
                }
                result
            }
            Err(err) => {
                warn!(error = %err, "failed to generate ipns key");
                Err(err.into())
            }
        };

        info!(%cid, "cleaning up ipfs node");
        if let Err(err) = deps.ipfs.pin_rm(&cid).await {
            warn!(%cid, error = %err, "failed to unpin test content");
        }

        result
    }

    fn registration(&self) -> Registration {
        Registration {
            schedule: self.schedule.clone(),
            collectors: vec![
                Box::new(self.publish_time.clone()),
                Box::new(self.ttfb.clone()),
                Box::new(self.fetch_time.clone()),
            ],
        }
    }
}
