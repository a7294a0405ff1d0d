//! The terminal sentinel probe.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};

/// Sentinel probe that signals engine shutdown when executed.
///
/// One-shot engines push it after all real probes; because the queue is
/// strict FIFO, it runs only once the real work has drained. It carries no
/// schedule and is never registered with the recurring scheduler.
pub struct TerminalProbe {
    id: ProbeId,
    shutdown: CancellationToken,
}

impl TerminalProbe {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            id: ProbeId::new(),
            shutdown,
        }
    }
}

#[async_trait]
impl Probe for TerminalProbe {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn run(&self, _deps: &ProbeDeps) -> Result<(), ProbeError> {
        debug!("terminal probe reached, signalling shutdown");
        self.shutdown.cancel();
        Ok(())
    }

    fn registration(&self) -> Registration {
        Registration::empty()
    }
}
