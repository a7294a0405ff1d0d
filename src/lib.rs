//! # gwmon
//!
//! Scheduled health and benchmark probes for IPFS HTTP gateways.
//!
//! A probe is a unit of schedulable work: it runs against a gateway (plus a
//! local IPFS node and, optionally, a pinning service) and reports latency
//! and correctness through prometheus collectors. The engine triggers
//! probes on cron schedules, deduplicates pending work, and executes one
//! probe at a time under a bounded time budget.
//!
//! ```text
//! Scheduler tick ──► ProbeQueue (FIFO + dedup) ──► Dispatcher ──► probe.run()
//!                                                      │
//!                                                      └──► error channel
//! ```
//!
//! Two modes:
//! - recurring ([`Engine::new`]): cron-driven, runs until [`Engine::stop`];
//! - one-shot ([`Engine::new_single`]): runs a fixed probe set to
//!   completion, then a terminal sentinel ends the dispatch loop.
//!
//! Probe failures never stop the engine; they are surfaced on the channel
//! returned by [`Engine::start`].

pub mod clients;
pub mod core;
pub mod engine;
pub mod metrics;
pub mod probes;

pub use crate::core::probe::{Probe, ProbeDeps, ProbeError, ProbeId, Registration};
pub use crate::core::schedule::{Schedule, ScheduleError};
pub use crate::core::terminal::TerminalProbe;
pub use clients::{
    ClientError, FetchOutcome, GatewayClient, IpfsClient, KeyInfo, PinState, PinStatus,
    PinningClient,
};
pub use engine::{Engine, EngineError, EngineState, ProbeQueue, PROBE_TIMEOUT};
pub use metrics::QueueMetrics;
