//! BDD step definitions for the phase policy

use cucumber::{then, when};
use slotwatch::monitor::CycleOutcome;

use crate::steps::lifecycle_steps::parse_phase;
use crate::world::SlotWatchWorld;

#[when(expr = "the phase is switched to {int}")]
fn switch_phase(world: &mut SlotWatchWorld, phase: u8) {
    world.monitor().set_phase(parse_phase(phase));
}

#[then("an alert is raised")]
fn alert_raised(world: &mut SlotWatchWorld) {
    let outcome = world.last_outcome.as_ref().expect("no check has run");
    assert!(outcome.alerted(), "expected an alert, got {:?}", outcome);
}

#[then("no alert is raised")]
fn no_alert_raised(world: &mut SlotWatchWorld) {
    let outcome = world.last_outcome.as_ref().expect("no check has run");
    assert!(!outcome.alerted(), "unexpected alert: {:?}", outcome);
}

#[then(expr = "{int} alert(s) has/have been raised")]
fn alerts_raised(world: &mut SlotWatchWorld, count: usize) {
    assert_eq!(world.alert_count, count);
}

#[then(expr = "the alert is suppressed because of {string}")]
fn suppressed_because(world: &mut SlotWatchWorld, expected: String) {
    match world.last_outcome.as_ref() {
        Some(CycleOutcome::Suppressed { reason, .. }) => assert_eq!(*reason, expected),
        other => panic!("expected a suppressed alert, got {:?}", other),
    }
}
