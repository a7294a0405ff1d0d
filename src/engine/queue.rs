//! Deduplicating FIFO queue of pending probes.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::probe::{Probe, ProbeId};
use crate::metrics::QueueMetrics;

/// How often the subscription forwarder attempts a pop. Delivery latency is
/// bounded by this interval, not by push time.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Default)]
struct Inner {
    order: VecDeque<Arc<dyn Probe>>,
    pending: HashSet<ProbeId>,
}

/// FIFO holding area admitting at most one pending entry per probe id.
///
/// Invariant: a probe id is in `pending` iff it appears exactly once in
/// `order`. All mutation is serialized through one lock; `subscribe` only
/// ever calls `pop`, so delivery takes the same lock internally.
pub struct ProbeQueue {
    inner: Mutex<Inner>,
    metrics: QueueMetrics,
}

impl ProbeQueue {
    pub fn new(metrics: QueueMetrics) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            metrics,
        }
    }

    /// Append probes in order, skipping any whose id is already pending.
    ///
    /// A skipped push is the backpressure signal: the schedule is firing
    /// faster than the dispatcher drains.
    pub fn push(&self, probes: impl IntoIterator<Item = Arc<dyn Probe>>) {
        let mut inner = self.inner.lock().expect("queue lock poisoned");
        for probe in probes {
            if !inner.pending.insert(probe.id()) {
                debug!(probe = %probe.id(), "probe already pending, push dropped");
                self.metrics.rejected.inc();
                continue;
            }
            inner.order.push_back(probe);
            self.metrics.depth.inc();
        }
    }

    /// Remove and return the oldest pending probe.
    pub fn pop(&self) -> Option<Arc<dyn Probe>> {
        let mut inner = self.inner.lock().expect("queue lock poisoned");
        let probe = inner.order.pop_front()?;
        inner.pending.remove(&probe.id());
        self.metrics.depth.dec();
        Some(probe)
    }

    /// Number of probes currently pending.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn a polling forwarder that delivers popped probes on a channel.
    ///
    /// This is work-stealing delivery, not broadcast: each popped probe
    /// goes to exactly one receiver, and a queue is meant to have a single
    /// live subscriber. The forwarder exits when the receiver is dropped.
    pub fn subscribe(self: &Arc<Self>) -> mpsc::Receiver<Arc<dyn Probe>> {
        let (tx, rx) = mpsc::channel(1);
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(POLL_INTERVAL);
            loop {
                tick.tick().await;
                if let Some(probe) = queue.pop() {
                    if tx.send(probe).await.is_err() {
                        break;
                    }
                }
            }
        });
        rx
    }

    #[cfg(test)]
    fn pending_set_len(&self) -> usize {
        self.inner
            .lock()
            .expect("queue lock poisoned")
            .pending
            .len()
    }
}
