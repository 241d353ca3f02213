//! BDD step definitions for alert delivery

use std::sync::Arc;
use std::time::Duration;

use cucumber::{then, when};
use slotwatch::notifier::Alert;

use crate::common::RecordingNotifier;
use crate::world::SlotWatchWorld;

/// Wait for every pending delivery to report back and record it in the log
async fn settle(world: &mut SlotWatchWorld) {
    let pending = std::mem::take(&mut world.dispatched).len();
    for _ in 0..pending {
        let rx = world.reports.as_mut().expect("monitor not created");
        let report = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("delivery did not report back")
            .expect("report channel closed");
        world.monitor().record_delivery(report);
    }
}

fn recorder<'a>(world: &'a SlotWatchWorld, channel: &str) -> &'a Arc<RecordingNotifier> {
    let recorder = match channel {
        "desktop" => &world.desktop,
        "speech" => &world.speech,
        "email" => &world.email,
        other => panic!("Unknown channel: {}", other),
    };
    recorder.as_ref().expect("monitor not created")
}

async fn delivered(world: &mut SlotWatchWorld, channel: &str) -> Vec<Alert> {
    settle(world).await;
    recorder(world, channel).alerts()
}

#[when("a test alert is sent")]
fn send_test_alert(world: &mut SlotWatchWorld) {
    world.dispatched = world.monitor().test_alert();
}

#[then(expr = "the alert is delivered via {word}")]
async fn alert_delivered(world: &mut SlotWatchWorld, channel: String) {
    let alerts = delivered(world, &channel).await;
    assert!(!alerts.is_empty(), "nothing delivered via {}", channel);
}

#[then(expr = "nothing is delivered via {word}")]
async fn nothing_delivered(world: &mut SlotWatchWorld, channel: String) {
    let alerts = delivered(world, &channel).await;
    assert!(alerts.is_empty(), "{} alert(s) delivered via {}", alerts.len(), channel);
}

#[then(expr = "{word} has received {int} alert(s)")]
async fn received_count(world: &mut SlotWatchWorld, channel: String, count: usize) {
    let alerts = delivered(world, &channel).await;
    assert_eq!(alerts.len(), count);
}

#[then(expr = "the delivered alert is titled {string}")]
async fn alert_titled(world: &mut SlotWatchWorld, title: String) {
    let alerts = delivered(world, "desktop").await;
    let latest = alerts.last().expect("no alert delivered");
    assert_eq!(latest.title, title);
}

#[then(expr = "the delivered message reads {string}")]
async fn message_reads(world: &mut SlotWatchWorld, message: String) {
    let alerts = delivered(world, "desktop").await;
    let latest = alerts.last().expect("no alert delivered");
    assert_eq!(latest.message, message);
}

#[then(expr = "the email goes to {string} with subject {string}")]
async fn email_sent(world: &mut SlotWatchWorld, to: String, subject: String) {
    let alerts = delivered(world, "email").await;
    let email = alerts
        .last()
        .and_then(|a| a.email.clone())
        .expect("no email delivered");
    assert_eq!(email.to, to);
    assert_eq!(email.subject, subject);
}
