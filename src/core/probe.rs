//! Probe trait, identity, and shared execution dependencies.
//!
//! A probe is a polymorphic unit of schedulable work: the engine only ever
//! sees `run` and `registration`, never a concrete probe type.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use prometheus::core::Collector;
use thiserror::Error;
use uuid::Uuid;

use crate::clients::{ClientError, GatewayClient, IpfsClient, PinningClient};

/// Unique identity for one probe instance.
///
/// Assigned at construction. The queue deduplicates on this id, so two
/// probes built from identical parameters are still distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeId(Uuid);

impl ProbeId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProbeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Metadata a probe declares at construction: its recurrence schedule and
/// the collectors to register with the engine's metrics registry.
pub struct Registration {
    /// 5-field cron expression (minute hour day-of-month month day-of-week).
    pub schedule: String,
    /// Collectors registered exactly once, at engine construction.
    pub collectors: Vec<Box<dyn Collector>>,
}

impl Registration {
    /// A registration with no schedule and no collectors.
    pub fn empty() -> Self {
        Self {
            schedule: String::new(),
            collectors: Vec::new(),
        }
    }
}

/// Read-only handles shared by every probe invocation.
#[derive(Debug, Clone)]
pub struct ProbeDeps {
    /// The gateway endpoint under test.
    pub gateway: GatewayClient,
    /// Local IPFS node RPC client.
    pub ipfs: IpfsClient,
    /// Pinning service client, when one is configured.
    pub pinner: Option<PinningClient>,
}

impl ProbeDeps {
    pub fn new(gateway: GatewayClient, ipfs: IpfsClient, pinner: Option<PinningClient>) -> Self {
        Self {
            gateway,
            ipfs,
            pinner,
        }
    }
}

/// Errors surfaced by a probe run.
///
/// These are reported on the engine's error channel and never stop the
/// dispatch loop.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A call to an external service failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Gateway content did not match what was published.
    #[error("response from gateway did not match expected content: {url}")]
    Mismatch { url: String },

    /// Gateway answered with a status the probe did not expect.
    #[error("unexpected status from gateway for {url}: got {got}, expected {expected}")]
    UnexpectedStatus { url: String, got: u16, expected: u16 },

    /// Could not construct the synthetic CID a probe needs.
    #[error("failed to build probe cid: {0}")]
    Cid(String),

    /// The probe requires a pinning service but none is configured.
    #[error("no pinning service configured")]
    NoPinningService,

    /// The pinning service gave up on the pin request.
    #[error("pinning service reported pin {requestid} as failed")]
    PinFailed { requestid: String },

    /// The dispatcher cut the probe off at its execution ceiling.
    #[error("probe exceeded execution ceiling of {0:?}")]
    Timeout(Duration),
}

/// A schedulable unit of work.
///
/// Implementations must be cheap to share (`Arc<dyn Probe>`) and safe to
/// run repeatedly; the engine may dispatch the same instance many times
/// over the process lifetime.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Stable identity used for queue deduplication.
    fn id(&self) -> ProbeId;

    /// Execute the probe against the shared external dependencies.
    async fn run(&self, deps: &ProbeDeps) -> Result<(), ProbeError>;

    /// Schedule and collectors declared at construction.
    fn registration(&self) -> Registration;
}
