//! Notifier trait and the alert payload shared by all delivery channels

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::ObservedRow;

/// A delivery channel of the alert sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Desktop,
    Speech,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Desktop => write!(f, "desktop"),
            Channel::Speech => write!(f, "speech"),
            Channel::Email => write!(f, "email"),
        }
    }
}

/// Outgoing email content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_test: bool,
}

/// Everything the channels need to announce matched slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub rows: Vec<ObservedRow>,
    pub is_test: bool,
    /// Present only when a destination address is configured
    pub email: Option<EmailMessage>,
}

impl Alert {
    /// Alert for slots found by a check cycle
    pub fn slots(rows: &[ObservedRow], recipient: Option<&str>, source_url: &str) -> Self {
        let locations = rows
            .iter()
            .map(|r| r.location.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let details = rows
            .iter()
            .map(|r| {
                format!(
                    "- {}: {} ({} dates) - {}",
                    r.location, r.earliest_date, r.total_dates, r.relative_time
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let email = recipient.map(|to| EmailMessage {
            to: to.to_string(),
            subject: format!("VISA SLOT ALERT: {} slot(s) found!", rows.len()),
            body: format!(
                "VISA SLOT FOUND!\n\nLocations: {}\n\nDetails:\n{}\n\nCheck now: {}\n\nTime: {}",
                locations,
                details,
                source_url,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            is_test: false,
        });

        Self {
            title: "VISA SLOT FOUND!".to_string(),
            message: format!("Found {} slot(s): {}", rows.len(), locations),
            rows: rows.to_vec(),
            is_test: false,
            email,
        }
    }

    /// Synthetic alert used to verify every channel works
    pub fn test(recipient: Option<&str>) -> Self {
        let email = recipient.map(|to| EmailMessage {
            to: to.to_string(),
            subject: "TEST: Visa Slot Monitor".to_string(),
            body: "This is a test email from Visa Slot Monitor. If you received this, \
                   email notifications are working!"
                .to_string(),
            is_test: true,
        });

        Self {
            title: "TEST ALERT".to_string(),
            message: "This is a test notification. Sound should play!".to_string(),
            rows: Vec::new(),
            is_test: true,
            email,
        }
    }
}

/// Trait for delivering alerts over one channel
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Which channel this notifier serves
    fn channel(&self) -> Channel;

    /// Deliver the alert
    async fn notify(&self, alert: &Alert) -> crate::Result<()>;
}
