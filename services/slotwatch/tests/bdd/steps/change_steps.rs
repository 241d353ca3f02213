//! BDD step definitions for change detection

use cucumber::then;
use slotwatch::monitor::CycleOutcome;

use crate::world::SlotWatchWorld;

#[then(expr = "the previous locations are {string}")]
fn previous_locations(world: &mut SlotWatchWorld, expected: String) {
    let expected = crate::common::parse_locations(&expected);
    assert_eq!(world.monitor().state().previous_locations, expected);
}

#[then("the previous locations are empty")]
fn previous_locations_empty(world: &mut SlotWatchWorld) {
    assert!(world.monitor().state().previous_locations.is_empty());
}

#[then(expr = "the cycle reports {word}")]
fn cycle_reports(world: &mut SlotWatchWorld, kind: String) {
    let outcome = world.last_outcome.as_ref().expect("no check has run");
    let matched = match kind.as_str() {
        "no-slots" => matches!(outcome, CycleOutcome::NoSlots),
        "unchanged" => matches!(outcome, CycleOutcome::Unchanged),
        "suppressed" => matches!(outcome, CycleOutcome::Suppressed { .. }),
        "alerted" => matches!(outcome, CycleOutcome::Alerted { .. }),
        "extraction-failure" => matches!(outcome, CycleOutcome::ExtractionFailed(_)),
        "communication-failure" => matches!(outcome, CycleOutcome::CommunicationFailed(_)),
        "target-lost" => matches!(outcome, CycleOutcome::TargetLost(_)),
        "skipped" => matches!(outcome, CycleOutcome::Skipped),
        other => panic!("Unknown outcome: {}", other),
    };
    assert!(matched, "expected {}, got {:?}", kind, outcome);
}
