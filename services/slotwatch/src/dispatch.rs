//! Fire-and-forget fan-out of alerts to every delivery channel

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::notifier::{Alert, Channel, Notifier};

/// Outcome of one channel's delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub channel: Channel,
    pub is_test: bool,
    pub result: Result<(), String>,
}

/// Sends each alert to all channels independently. Delivery runs on spawned
/// tasks; outcomes come back as [`DeliveryReport`]s on the report channel.
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    reports: mpsc::UnboundedSender<DeliveryReport>,
}

impl AlertDispatcher {
    pub fn new(
        notifiers: Vec<Arc<dyn Notifier>>,
        reports: mpsc::UnboundedSender<DeliveryReport>,
    ) -> Self {
        Self { notifiers, reports }
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.notifiers.iter().any(|n| n.channel() == channel)
    }

    /// Start delivery on every applicable channel and return the channels started.
    /// Email is skipped when the alert carries no email.
    pub fn dispatch(&self, alert: Alert) -> Vec<Channel> {
        let alert = Arc::new(alert);
        let mut started = Vec::with_capacity(self.notifiers.len());

        for notifier in &self.notifiers {
            let channel = notifier.channel();
            if channel == Channel::Email && alert.email.is_none() {
                continue;
            }

            let notifier = Arc::clone(notifier);
            let alert = Arc::clone(&alert);
            let reports = self.reports.clone();
            tokio::spawn(async move {
                tracing::debug!("Delivering alert via {}", channel);
                let result = notifier.notify(&alert).await.map_err(|e| e.to_string());
                if let Err(e) = &result {
                    tracing::warn!("Alert delivery via {} failed: {}", channel, e);
                }
                // receiver gone means the loop has shut down
                let _ = reports.send(DeliveryReport {
                    channel,
                    is_test: alert.is_test,
                    result,
                });
            });
            started.push(channel);
        }

        started
    }
}
