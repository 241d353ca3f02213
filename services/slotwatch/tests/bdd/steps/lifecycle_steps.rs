//! BDD step definitions for session lifecycle

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use slotwatch::dispatch::AlertDispatcher;
use slotwatch::extractor::Extraction;
use slotwatch::monitor::{CycleOutcome, SlotMonitor};
use slotwatch::notifier::{Channel, Notifier};
use slotwatch::schedule::RetryPolicy;
use slotwatch::state::{MonitorState, RunState, Severity};
use slotwatch::{Mode, Phase, SlotWatchError};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::common::{RecordingNotifier, ScriptedExtractor};
use crate::world::SlotWatchWorld;

const WARMUP: Duration = Duration::from_secs(4);

pub fn parse_phase(phase: u8) -> Phase {
    Phase::try_from(phase).unwrap_or_else(|e| panic!("{}", e))
}

pub fn parse_channel(s: &str) -> Channel {
    match s {
        "desktop" => Channel::Desktop,
        "speech" => Channel::Speech,
        "email" => Channel::Email,
        other => panic!("Unknown channel: {}", other),
    }
}

fn recorder(channel: Channel, failing: Option<Channel>) -> Arc<RecordingNotifier> {
    if failing == Some(channel) {
        Arc::new(RecordingNotifier::failing(channel))
    } else {
        Arc::new(RecordingNotifier::new(channel))
    }
}

fn build_monitor(world: &mut SlotWatchWorld, phase: Phase, failing: Option<Channel>) {
    let extractor = Arc::new(ScriptedExtractor::default());
    let desktop = recorder(Channel::Desktop, failing);
    let speech = recorder(Channel::Speech, failing);
    let email = recorder(Channel::Email, failing);

    let (tx, rx) = mpsc::unbounded_channel();
    let notifiers: Vec<Arc<dyn Notifier>> = vec![desktop.clone(), speech.clone(), email.clone()];
    let retry = RetryPolicy {
        attempts: 1,
        initial_delay: Duration::from_millis(10),
    };

    world.monitor = Some(SlotMonitor::new(
        MonitorState::new(Mode::Fast, phase, 100),
        extractor.clone(),
        AlertDispatcher::new(notifiers, tx),
        retry,
    ));
    world.extractor = Some(extractor);
    world.reports = Some(rx);
    world.desktop = Some(desktop);
    world.speech = Some(speech);
    world.email = Some(email);
}

#[given(expr = "a monitor in phase {int}")]
fn idle_monitor(world: &mut SlotWatchWorld, phase: u8) {
    build_monitor(world, parse_phase(phase), None);
}

#[given(expr = "a running monitor in phase {int}")]
fn running_monitor(world: &mut SlotWatchWorld, phase: u8) {
    build_monitor(world, parse_phase(phase), None);
    assert!(world.monitor().start(None, None, WARMUP, Instant::now()));
}

#[given(expr = "a running monitor in phase {int} whose {word} channel fails")]
fn running_monitor_with_failure(world: &mut SlotWatchWorld, phase: u8, channel: String) {
    build_monitor(world, parse_phase(phase), Some(parse_channel(&channel)));
    assert!(world.monitor().start(None, None, WARMUP, Instant::now()));
}

#[given(expr = "the recipient email is {string}")]
fn recipient_email(world: &mut SlotWatchWorld, email: String) {
    world
        .monitor()
        .set_email(Some(email))
        .expect("valid recipient address");
}

#[when("the monitor is started")]
fn start_monitor(world: &mut SlotWatchWorld) {
    let started = world.monitor().start(None, None, WARMUP, Instant::now());
    world.start_result = Some(started);
}

#[when(expr = "the monitor is started in {word} mode")]
fn start_monitor_in_mode(world: &mut SlotWatchWorld, mode: String) {
    let mode = match mode.as_str() {
        "FAST" => Mode::Fast,
        "SLOW" => Mode::Slow,
        other => panic!("Unknown mode: {}", other),
    };
    let started = world
        .monitor()
        .start(Some(mode), None, WARMUP, Instant::now());
    world.start_result = Some(started);
}

#[when("the monitor is stopped")]
fn stop_monitor(world: &mut SlotWatchWorld) {
    world.monitor().stop();
}

async fn run_check(world: &mut SlotWatchWorld) {
    let outcome = world.monitor().run_check().await;
    if let CycleOutcome::Alerted { channels, .. } = &outcome {
        world.alert_count += 1;
        world.dispatched = channels.clone();
    }
    world.last_outcome = Some(outcome);
}

#[when(expr = "a check finds {string}")]
async fn check_finds(world: &mut SlotWatchWorld, locations: String) {
    let locations = crate::common::parse_locations(&locations);
    let refs: Vec<&str> = locations.iter().map(String::as_str).collect();
    world.extractor().push_rows(&refs);
    run_check(world).await;
}

#[when("a check finds no slots")]
async fn check_finds_nothing(world: &mut SlotWatchWorld) {
    world.extractor().push_rows(&[]);
    run_check(world).await;
}

#[when("the page is unreachable")]
async fn page_unreachable(world: &mut SlotWatchWorld) {
    for _ in 0..2 {
        world
            .extractor()
            .push_error(SlotWatchError::Communication("connection refused".to_string()));
    }
    run_check(world).await;
}

#[when(expr = "the page is briefly unreachable and then lists {string}")]
async fn page_briefly_unreachable(world: &mut SlotWatchWorld, locations: String) {
    world
        .extractor()
        .push_error(SlotWatchError::Communication("connection reset".to_string()));
    let locations = crate::common::parse_locations(&locations);
    let refs: Vec<&str> = locations.iter().map(String::as_str).collect();
    world.extractor().push_rows(&refs);
    run_check(world).await;
}

#[when("the page has been removed")]
async fn page_removed(world: &mut SlotWatchWorld) {
    world
        .extractor()
        .push_error(SlotWatchError::TargetLost("status 404".to_string()));
    run_check(world).await;
}

#[when("the page has no availability table")]
async fn page_without_table(world: &mut SlotWatchWorld) {
    world
        .extractor()
        .push(Ok(Extraction::failed("H-1B section not found")));
    run_check(world).await;
}

#[then("the monitor is running")]
fn monitor_running(world: &mut SlotWatchWorld) {
    assert!(world.monitor().state().is_running());
}

#[then("the monitor is idle")]
fn monitor_idle(world: &mut SlotWatchWorld) {
    let state = world.monitor().state();
    assert_eq!(state.run_state, RunState::Idle);
    assert!(state.next_check_at.is_none());
}

#[then("the start is rejected")]
fn start_rejected(world: &mut SlotWatchWorld) {
    assert_eq!(world.start_result, Some(false));
}

#[then(expr = "the mode is {word}")]
fn mode_is(world: &mut SlotWatchWorld, mode: String) {
    assert_eq!(world.monitor().state().mode.to_string(), mode);
}

#[then(expr = "the check count is {int}")]
fn check_count_is(world: &mut SlotWatchWorld, count: u64) {
    assert_eq!(world.monitor().state().check_count, count);
}

#[then(expr = "the page was requested {int} time(s)")]
fn page_requested(world: &mut SlotWatchWorld, count: u32) {
    assert_eq!(world.extractor().calls(), count);
}

#[then(expr = "the log contains {string}")]
fn log_contains(world: &mut SlotWatchWorld, needle: String) {
    let found = world
        .monitor()
        .state()
        .logs
        .iter()
        .any(|e| e.message.contains(&needle));
    assert!(found, "no log entry contains '{}'", needle);
}

#[then(expr = "the log does not contain {string}")]
fn log_lacks(world: &mut SlotWatchWorld, needle: String) {
    let found = world
        .monitor()
        .state()
        .logs
        .iter()
        .any(|e| e.message.contains(&needle));
    assert!(!found, "unexpected log entry containing '{}'", needle);
}

#[then(expr = "the newest log entry is a(n) {word}")]
fn newest_severity(world: &mut SlotWatchWorld, severity: String) {
    let expected = match severity.as_str() {
        "info" => Severity::Info,
        "success" => Severity::Success,
        "warning" => Severity::Warning,
        "error" => Severity::Error,
        "alert" => Severity::Alert,
        other => panic!("Unknown severity: {}", other),
    };
    let newest = world
        .monitor()
        .state()
        .logs
        .newest()
        .map(|e| e.severity);
    assert_eq!(newest, Some(expected));
}
