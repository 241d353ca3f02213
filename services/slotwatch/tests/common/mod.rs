//! Fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use slotwatch::extractor::{Extraction, PageExtractor};
use slotwatch::notifier::{Alert, Channel, Notifier};
use slotwatch::{Mode, ObservedRow, SlotWatchError};

pub const TARGET_URL: &str = "https://slots.test/latest/";

pub fn rows(locations: &[&str]) -> Vec<ObservedRow> {
    locations
        .iter()
        .map(|l| ObservedRow::new(*l, "Feb 03, 2026", "2", "5 seconds ago"))
        .collect()
}

/// Parse "A, B" into location names; an empty string means none
pub fn parse_locations(list: &str) -> Vec<String> {
    list.split(',')
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Extractor that replays queued results, then repeats a fallback
#[derive(Debug, Default)]
pub struct ScriptedExtractor {
    script: Mutex<VecDeque<slotwatch::Result<Extraction>>>,
    fallback: Mutex<Vec<ObservedRow>>,
    latency: Mutex<Option<Duration>>,
    calls: AtomicU32,
}

impl ScriptedExtractor {
    pub fn push_rows(&self, locations: &[&str]) {
        self.push(Ok(Extraction::rows(rows(locations))));
    }

    pub fn push_error(&self, error: SlotWatchError) {
        self.push(Err(error));
    }

    pub fn push(&self, result: slotwatch::Result<Extraction>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn set_fallback(&self, locations: &[&str]) {
        *self.fallback.lock().unwrap() = rows(locations);
    }

    /// Make every request take `latency` before answering
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageExtractor for ScriptedExtractor {
    fn target_url(&self) -> &str {
        TARGET_URL
    }

    async fn extract(&self, _mode: Mode) -> slotwatch::Result<Extraction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(Extraction::rows(self.fallback.lock().unwrap().clone())),
        }
    }
}

/// Notifier that records every alert it receives
#[derive(Debug)]
pub struct RecordingNotifier {
    channel: Channel,
    succeed: bool,
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingNotifier {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            succeed: true,
            alerts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(channel: Channel) -> Self {
        Self {
            succeed: false,
            ..Self::new(channel)
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn notify(&self, alert: &Alert) -> slotwatch::Result<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.succeed {
            Ok(())
        } else {
            Err(SlotWatchError::Notifier(format!(
                "{} unavailable",
                self.channel
            )))
        }
    }
}
