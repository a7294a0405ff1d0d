//! Engine lifecycle and dispatch behavior.

use std::sync::Arc;
use std::time::Duration;

use gwmon::metrics::Registry;
use gwmon::{Engine, EngineError, EngineState, Probe, ProbeError};

use crate::common::{stub_deps, CountingProbe, HangingProbe, InstrumentedProbe};

#[tokio::test]
async fn test_one_shot_runs_each_probe_exactly_once_despite_failures() {
    let a = CountingProbe::ok();
    let b = CountingProbe::failing();
    let c = CountingProbe::ok();

    let registry = Registry::new();
    let mut engine = Engine::new_single(
        stub_deps(),
        &registry,
        vec![
            a.clone() as Arc<dyn Probe>,
            b.clone() as Arc<dyn Probe>,
            c.clone() as Arc<dyn Probe>,
        ],
    )
    .unwrap();
    let mut errors = engine.start().unwrap();

    let mut reported = Vec::new();
    while let Some(err) = errors.recv().await {
        reported.push(err);
    }

    // The failing probe did not stop the ones behind it.
    assert_eq!(reported.len(), 1);
    assert!(matches!(reported[0], ProbeError::Mismatch { .. }));
    assert_eq!(a.runs(), 1);
    assert_eq!(b.runs(), 1);
    assert_eq!(c.runs(), 1);
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn test_one_shot_with_no_probes_closes_with_no_errors() {
    let registry = Registry::new();
    let mut engine = Engine::new_single(stub_deps(), &registry, Vec::new()).unwrap();
    let mut errors = engine.start().unwrap();

    assert!(errors.recv().await.is_none());
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn test_hung_probe_is_cut_off_and_next_probe_still_runs() {
    let hung = HangingProbe::new();
    let after = CountingProbe::ok();

    let registry = Registry::new();
    let mut engine = Engine::new_single(
        stub_deps(),
        &registry,
        vec![hung.clone() as Arc<dyn Probe>, after.clone() as Arc<dyn Probe>],
    )
    .unwrap()
    .with_probe_timeout(Duration::from_millis(100));
    let mut errors = engine.start().unwrap();

    let first = errors.recv().await.unwrap();
    assert!(matches!(first, ProbeError::Timeout(_)));

    // Channel closes once the terminal sentinel fires; the probe queued
    // behind the hung one must have run.
    assert!(errors.recv().await.is_none());
    assert_eq!(hung.started(), 1);
    assert_eq!(after.runs(), 1);
}

#[tokio::test]
async fn test_stop_closes_channel_without_draining_pending() {
    // Schedule that cannot fire during the test.
    let probe = CountingProbe::with_schedule("0 0 1 1 *", false);

    let registry = Registry::new();
    let mut engine =
        Engine::new(stub_deps(), &registry, vec![probe.clone() as Arc<dyn Probe>]).unwrap();
    let mut errors = engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);

    engine.stop();

    assert!(errors.recv().await.is_none());
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(probe.runs(), 0);
}

#[tokio::test]
async fn test_stop_is_idempotent_and_nonblocking() {
    let registry = Registry::new();
    let engine = Engine::new(stub_deps(), &registry, Vec::new()).unwrap();

    // No live dispatcher; both calls must return immediately.
    engine.stop();
    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn test_engine_cannot_start_twice() {
    let registry = Registry::new();
    let mut engine = Engine::new_single(stub_deps(), &registry, Vec::new()).unwrap();
    let _errors = engine.start().unwrap();

    assert!(matches!(
        engine.start(),
        Err(EngineError::NotStartable(EngineState::Running))
    ));
}

#[tokio::test]
async fn test_stopped_engine_cannot_be_restarted() {
    let registry = Registry::new();
    let mut engine = Engine::new(stub_deps(), &registry, Vec::new()).unwrap();
    engine.stop();

    assert!(matches!(
        engine.start(),
        Err(EngineError::NotStartable(EngineState::Stopped))
    ));
}

#[tokio::test]
async fn test_malformed_schedule_is_fatal_at_construction() {
    let probe = CountingProbe::with_schedule("every now and then", false);

    let registry = Registry::new();
    let result = Engine::new(stub_deps(), &registry, vec![probe as Arc<dyn Probe>]);

    assert!(matches!(result, Err(EngineError::Schedule { .. })));
}

#[tokio::test]
async fn test_failed_construction_leaves_registry_reusable() {
    // A probe with a collector ahead of one with a bad schedule: the
    // failed construction must register nothing, so a corrected retry
    // against the same registry succeeds.
    let registry = Registry::new();
    let good = InstrumentedProbe::new("0 * * * *");
    let bad = CountingProbe::with_schedule("not a schedule", false);

    let result = Engine::new(
        stub_deps(),
        &registry,
        vec![good.clone() as Arc<dyn Probe>, bad as Arc<dyn Probe>],
    );
    assert!(matches!(result, Err(EngineError::Schedule { .. })));

    Engine::new(stub_deps(), &registry, vec![good as Arc<dyn Probe>]).unwrap();
}

#[tokio::test]
async fn test_recurring_mode_preloads_nothing() {
    let probe = CountingProbe::with_schedule("0 0 1 1 *", false);
    let registry = Registry::new();
    let engine = Engine::new(stub_deps(), &registry, vec![probe as Arc<dyn Probe>]).unwrap();

    assert_eq!(engine.pending(), 0);
    assert_eq!(engine.state(), EngineState::Constructed);
}

#[tokio::test]
async fn test_one_shot_preloads_probes_plus_terminal() {
    let registry = Registry::new();
    let engine = Engine::new_single(
        stub_deps(),
        &registry,
        vec![CountingProbe::ok() as Arc<dyn Probe>, CountingProbe::ok() as Arc<dyn Probe>],
    )
    .unwrap();

    assert_eq!(engine.pending(), 3);
}
