//! Scheduling and dispatch engine.
//!
//! The engine composes three pieces: a deduplicating FIFO queue, a cron
//! evaluator that feeds it, and a single sequential dispatcher that drains
//! it under a bounded per-probe time budget.

mod core;
mod queue;
mod scheduler;

pub use self::core::{Engine, EngineError, EngineState, PROBE_TIMEOUT};
pub use queue::ProbeQueue;
