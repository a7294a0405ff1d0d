//! Engine construction, the dispatcher loop, and lifecycle.

use std::sync::Arc;
use std::time::Duration;

use prometheus::Registry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::ProbeQueue;
use super::scheduler::{self, ScheduleEntry};
use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId};
use crate::core::schedule::{Schedule, ScheduleError};
use crate::core::terminal::TerminalProbe;
use crate::metrics::QueueMetrics;

/// Execution ceiling for a single probe run.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Errors from engine construction or lifecycle misuse.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A probe declared a malformed schedule; fatal before start.
    #[error("invalid schedule for probe {probe}: {source}")]
    Schedule {
        probe: ProbeId,
        #[source]
        source: ScheduleError,
    },

    /// Registering a probe's collectors failed.
    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Start was called from a state that does not allow it.
    #[error("engine cannot start from the {0:?} state")]
    NotStartable(EngineState),
}

/// Lifecycle states. `Stopped` is terminal; a stopped engine must be
/// reconstructed, never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Constructed,
    Running,
    Stopped,
}

/// Composes the queue, the recurring scheduler, and the dispatcher.
///
/// Exactly one engine exists per process invocation. All queue and
/// schedule state is in-memory only; nothing survives a restart.
pub struct Engine {
    queue: Arc<ProbeQueue>,
    deps: ProbeDeps,
    shutdown: CancellationToken,
    probe_timeout: Duration,
    started: bool,
    scheduler: Option<JoinHandle<()>>,
}

impl Engine {
    /// Recurring mode: parse every probe's schedule (malformed expressions
    /// fail here, not at runtime), register its collectors with `registry`,
    /// and start the trigger loop immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        deps: ProbeDeps,
        registry: &Registry,
        probes: Vec<Arc<dyn Probe>>,
    ) -> Result<Self, EngineError> {
        let queue = Arc::new(ProbeQueue::new(QueueMetrics::new(registry)?));
        let shutdown = CancellationToken::new();

        // Validate every schedule before touching the registry, so a
        // failed construction leaves the registry clean for a retry.
        let mut entries = Vec::with_capacity(probes.len());
        let mut collectors = Vec::new();
        for probe in probes {
            let registration = probe.registration();
            let schedule =
                Schedule::parse(&registration.schedule).map_err(|source| EngineError::Schedule {
                    probe: probe.id(),
                    source,
                })?;
            collectors.extend(registration.collectors);
            entries.push(ScheduleEntry { probe, schedule });
        }
        for collector in collectors {
            registry.register(collector)?;
        }

        let scheduler = scheduler::spawn(entries, Arc::clone(&queue), shutdown.child_token());

        Ok(Self {
            queue,
            deps,
            shutdown,
            probe_timeout: PROBE_TIMEOUT,
            started: false,
            scheduler: Some(scheduler),
        })
    }

    /// One-shot mode: preload the given probes in order, then a terminal
    /// sentinel that stops the engine once they have all drained. No
    /// scheduler runs and schedules are not consulted.
    pub fn new_single(
        deps: ProbeDeps,
        registry: &Registry,
        probes: Vec<Arc<dyn Probe>>,
    ) -> Result<Self, EngineError> {
        let queue = Arc::new(ProbeQueue::new(QueueMetrics::new(registry)?));
        let shutdown = CancellationToken::new();

        for probe in &probes {
            for collector in probe.registration().collectors {
                registry.register(collector)?;
            }
        }

        queue.push(probes);
        queue.push([Arc::new(TerminalProbe::new(shutdown.clone())) as Arc<dyn Probe>]);

        Ok(Self {
            queue,
            deps,
            shutdown,
            probe_timeout: PROBE_TIMEOUT,
            started: false,
            scheduler: None,
        })
    }

    /// Override the per-probe execution ceiling. Intended for tests and
    /// deployments probing slow gateways.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        if self.shutdown.is_cancelled() {
            EngineState::Stopped
        } else if self.started {
            EngineState::Running
        } else {
            EngineState::Constructed
        }
    }

    /// Number of probes currently pending in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Enter `Running`: spawn the single sequential dispatcher and return
    /// the channel on which probe failures are reported.
    ///
    /// The dispatcher executes probes strictly one at a time; a slow probe
    /// delays everything behind it, bounded per probe by the execution
    /// ceiling. Errors are forwarded and the loop moves on; the channel
    /// closes when the engine stops.
    pub fn start(&mut self) -> Result<mpsc::Receiver<ProbeError>, EngineError> {
        match self.state() {
            EngineState::Constructed => {}
            other => return Err(EngineError::NotStartable(other)),
        }
        self.started = true;

        let mut feed = self.queue.subscribe();
        let deps = self.deps.clone();
        let shutdown = self.shutdown.clone();
        let timeout = self.probe_timeout;
        let (err_tx, err_rx) = mpsc::channel(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Shutdown wins over a ready probe: once signalled,
                    // nothing further is drained even if pending.
                    biased;

                    _ = shutdown.cancelled() => {
                        info!("dispatcher shutting down");
                        break;
                    }
                    next = feed.recv() => {
                        let Some(probe) = next else { break };
                        let id = probe.id();
                        debug!(probe = %id, "dispatching probe");
                        match tokio::time::timeout(timeout, probe.run(&deps)).await {
                            Ok(Ok(())) => debug!(probe = %id, "probe succeeded"),
                            Ok(Err(err)) => {
                                warn!(probe = %id, error = %err, "probe failed");
                                if err_tx.send(err).await.is_err() {
                                    break;
                                }
                            }
                            Err(_) => {
                                warn!(probe = %id, ceiling = ?timeout, "probe cancelled at execution ceiling");
                                if err_tx.send(ProbeError::Timeout(timeout)).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(err_rx)
    }

    /// Signal shutdown. Non-blocking and idempotent: the dispatcher
    /// observes it between probes, so an in-flight run finishes (or hits
    /// its ceiling) first.
    pub fn stop(&self) {
        info!("graceful shutdown requested");
        self.shutdown.cancel();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.abort();
        }
    }
}
