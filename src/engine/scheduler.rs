//! Recurring trigger loop.
//!
//! Owns its own timer, independent of the dispatcher: every tick it checks
//! which schedules have an occurrence in the window since the last tick and
//! pushes the bound probes. Push is lock-protected and non-blocking, so a
//! slow dispatcher never stalls the timer; the queue's dedup rule is the
//! only thing bounding how far the schedule can run ahead.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::queue::ProbeQueue;
use crate::core::probe::Probe;
use crate::core::schedule::Schedule;

/// How often schedules are re-evaluated. Minute-resolution expressions
/// fire at most once per due minute regardless of this value.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A probe bound to its parsed schedule.
pub(crate) struct ScheduleEntry {
    pub probe: Arc<dyn Probe>,
    pub schedule: Schedule,
}

/// Queue every probe whose schedule has an occurrence in `(last, now]`.
pub(crate) fn check_due(
    entries: &[ScheduleEntry],
    queue: &ProbeQueue,
    last: DateTime<Utc>,
    now: DateTime<Utc>,
) {
    for entry in entries {
        if entry.schedule.due_between(last, now) {
            debug!(
                probe = %entry.probe.id(),
                expression = entry.schedule.expression(),
                "queueing scheduled probe"
            );
            queue.push([Arc::clone(&entry.probe)]);
        }
    }
}

/// Spawn the trigger loop; it runs until the shutdown token fires.
pub(crate) fn spawn(
    entries: Vec<ScheduleEntry>,
    queue: Arc<ProbeQueue>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_check = Utc::now();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("recurring scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    let now = Utc::now();
                    check_due(&entries, &queue, last_check, now);
                    last_check = now;
                }
            }
        }
    })
}
