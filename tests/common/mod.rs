//! Shared stubs for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gwmon::{GatewayClient, IpfsClient, Probe, ProbeDeps, ProbeError, ProbeId, Registration};
use prometheus::IntCounter;
use uuid::Uuid;

/// Dependencies pointing at nothing; for probes that never touch them.
pub fn stub_deps() -> ProbeDeps {
    ProbeDeps::new(
        GatewayClient::new("http://127.0.0.1:1"),
        IpfsClient::new("http://127.0.0.1:1"),
        None,
    )
}

/// Probe that counts its invocations and optionally always fails.
pub struct CountingProbe {
    id: ProbeId,
    schedule: String,
    runs: AtomicUsize,
    fail: bool,
}

impl CountingProbe {
    pub fn ok() -> Arc<Self> {
        Self::with_schedule("0 * * * *", false)
    }

    pub fn failing() -> Arc<Self> {
        Self::with_schedule("0 * * * *", true)
    }

    pub fn with_schedule(schedule: &str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            runs: AtomicUsize::new(0),
            fail,
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for CountingProbe {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, _deps: &ProbeDeps) -> Result<(), ProbeError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ProbeError::Mismatch {
                url: "stub://always-fails".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn registration(&self) -> Registration {
        Registration {
            schedule: self.schedule.clone(),
            collectors: Vec::new(),
        }
    }
}

/// Probe that sleeps far past any test-sized execution ceiling.
pub struct HangingProbe {
    id: ProbeId,
    started: AtomicUsize,
}

impl HangingProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: ProbeId::new(),
            started: AtomicUsize::new(0),
        })
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for HangingProbe {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, _deps: &ProbeDeps) -> Result<(), ProbeError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(())
    }

    fn registration(&self) -> Registration {
        Registration {
            schedule: "0 * * * *".to_string(),
            collectors: Vec::new(),
        }
    }
}

/// Probe carrying one collector, for registry interaction tests. Each
/// instance gets a unique metric name so several can share a registry.
pub struct InstrumentedProbe {
    id: ProbeId,
    schedule: String,
    counter: IntCounter,
}

impl InstrumentedProbe {
    pub fn new(schedule: &str) -> Arc<Self> {
        let name = format!("stub_runs_{}", Uuid::new_v4().simple());
        Arc::new(Self {
            id: ProbeId::new(),
            schedule: schedule.to_string(),
            counter: IntCounter::new(name, "Runs of one stub probe").expect("static counter opts"),
        })
    }
}

#[async_trait]
impl Probe for InstrumentedProbe {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, _deps: &ProbeDeps) -> Result<(), ProbeError> {
        self.counter.inc();
        Ok(())
    }

    fn registration(&self) -> Registration {
        Registration {
            schedule: self.schedule.clone(),
            collectors: vec![Box::new(self.counter.clone())],
        }
    }
}
