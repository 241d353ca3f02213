//! The check cycle: extraction with retry, change detection, phase policy
//! and alert dispatch over one exclusively owned [`MonitorState`].
//!
//! Timing lives in [`crate::engine`]; this type only records deadlines it is
//! handed, so every transition can be driven directly in tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::detect::{self, ChangeOutcome};
use crate::dispatch::{AlertDispatcher, DeliveryReport};
use crate::extractor::{Extraction, PageExtractor};
use crate::model::{normalize_email, Mode, ObservedRow, Phase};
use crate::notifier::{Alert, Channel};
use crate::policy;
use crate::schedule::RetryPolicy;
use crate::state::{MonitorState, RunState, Severity};

/// What a single check cycle concluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No session is running
    Skipped,
    NoSlots,
    Unchanged,
    /// New trigger that the phase policy did not let through
    Suppressed {
        locations: Vec<String>,
        reason: &'static str,
    },
    Alerted {
        locations: Vec<String>,
        channels: Vec<Channel>,
    },
    /// The page was reachable but had no availability table
    ExtractionFailed(String),
    /// The page could not be reached even after retrying
    CommunicationFailed(String),
    /// The page is gone; the session has ended
    TargetLost(String),
}

impl CycleOutcome {
    pub fn alerted(&self) -> bool {
        matches!(self, CycleOutcome::Alerted { .. })
    }
}

pub struct SlotMonitor {
    state: MonitorState,
    extractor: Arc<dyn PageExtractor>,
    dispatcher: AlertDispatcher,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SlotMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotMonitor")
            .field("state", &self.state.run_state)
            .field("target", &self.extractor.target_url())
            .finish()
    }
}

impl SlotMonitor {
    pub fn new(
        state: MonitorState,
        extractor: Arc<dyn PageExtractor>,
        dispatcher: AlertDispatcher,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            state,
            extractor,
            dispatcher,
            retry,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn target_url(&self) -> &str {
        self.extractor.target_url()
    }

    /// Begin a fresh session whose first check fires after `warmup`.
    /// Returns false, changing nothing, if a session is already running.
    pub fn start(
        &mut self,
        mode: Option<Mode>,
        phase: Option<Phase>,
        warmup: Duration,
        now: Instant,
    ) -> bool {
        if self.state.is_running() {
            self.state.log("Already running", Severity::Warning);
            return false;
        }

        if let Some(mode) = mode {
            self.state.mode = mode;
        }
        if let Some(phase) = phase {
            self.state.phase = phase;
        }
        self.state.reset_session();

        self.state.log("Starting monitoring", Severity::Success);
        self.state.log(
            format!("Mode: {}, Phase: {}", self.state.mode, self.state.phase),
            Severity::Info,
        );
        self.state.log(
            format!("Watching {}", self.extractor.target_url()),
            Severity::Info,
        );

        self.state.run_state = RunState::Waiting;
        self.state.next_check_at = Some(now + warmup);
        self.state.log(
            format!("First check in {}s", warmup.as_secs()),
            Severity::Info,
        );
        true
    }

    /// End the session on an explicit stop, cancelling any pending check
    pub fn stop(&mut self) {
        self.state.run_state = RunState::Idle;
        self.state.next_check_at = None;
        self.state.log("Monitoring stopped", Severity::Warning);
    }

    fn target_lost(&mut self, reason: &str) {
        self.state.run_state = RunState::Idle;
        self.state.next_check_at = None;
        self.state.log(
            format!("Monitored page lost ({}), monitoring stopped", reason),
            Severity::Warning,
        );
    }

    /// Enter WAITING with the next check due `interval` after `now`
    pub fn schedule_next(&mut self, interval: Duration, now: Instant) {
        if !self.state.is_running() {
            return;
        }
        self.state.run_state = RunState::Waiting;
        self.state.next_check_at = Some(now + interval);
        self.state.log(
            format!(
                "Next check in {}s ({} mode)",
                interval.as_secs(),
                self.state.mode
            ),
            Severity::Info,
        );
    }

    /// Enter CHECKING and count the check. Returns false if no session is running.
    pub fn begin_check(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.state.run_state = RunState::Checking;
        self.state.next_check_at = None;
        self.state.check_count += 1;
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        self.state.log(
            format!("[{}] Check #{}", time, self.state.check_count),
            Severity::Info,
        );
        self.state.last_check_time = Some(time);
        true
    }

    /// Run one full check cycle
    pub async fn run_check(&mut self) -> CycleOutcome {
        if !self.begin_check() {
            return CycleOutcome::Skipped;
        }
        self.perform_check().await
    }

    /// Extraction and decision for a cycle already started with [`Self::begin_check`]
    pub async fn perform_check(&mut self) -> CycleOutcome {
        if self.state.run_state != RunState::Checking {
            return CycleOutcome::Skipped;
        }

        let mode = self.state.mode;
        let mut retries = 0;
        let result = loop {
            match self.extractor.extract(mode).await {
                Err(e) => match self.plan_retry(&e, retries) {
                    Some(delay) => {
                        retries += 1;
                        tokio::time::sleep(delay).await;
                    }
                    None => break Err(e),
                },
                result => break result,
            }
        };
        self.finish_check(result)
    }

    /// Delay before the next attempt after `retries` retries already made,
    /// or `None` if the failure ends the cycle
    pub fn plan_retry(
        &mut self,
        error: &crate::SlotWatchError,
        retries: u32,
    ) -> Option<Duration> {
        let lost = matches!(error, crate::SlotWatchError::TargetLost(_));
        if lost || retries >= self.retry.attempts {
            return None;
        }
        let delay = self.retry.delay_for(retries + 1);
        self.state.log(
            format!("{}; retrying in {}ms", error, delay.as_millis()),
            Severity::Warning,
        );
        Some(delay)
    }

    /// Conclude a cycle with the final extraction result
    pub fn finish_check(&mut self, result: crate::Result<Extraction>) -> CycleOutcome {
        if self.state.run_state != RunState::Checking {
            return CycleOutcome::Skipped;
        }

        let extraction = match result {
            Ok(extraction) => extraction,
            Err(crate::SlotWatchError::TargetLost(reason)) => {
                self.target_lost(&reason);
                return CycleOutcome::TargetLost(reason);
            }
            Err(e) => {
                let message = e.to_string();
                self.state.log(format!("Check failed: {}", message), Severity::Error);
                return CycleOutcome::CommunicationFailed(message);
            }
        };

        if !extraction.success {
            let error = extraction
                .error
                .unwrap_or_else(|| "extraction failed".to_string());
            self.state.log(error.clone(), Severity::Warning);
            return CycleOutcome::ExtractionFailed(error);
        }

        self.state.log("Checked H-1B section successfully", Severity::Success);
        self.state.log(
            format!("{} slot(s) match pattern", extraction.rows.len()),
            Severity::Info,
        );
        for row in &extraction.rows {
            self.state.log(
                format!(
                    "| {} | {} | {}",
                    row.location, row.earliest_date, row.relative_time
                ),
                Severity::Info,
            );
        }

        self.process_rows(&extraction.rows)
    }

    /// Change detection and phase policy for this cycle's rows
    pub fn process_rows(&mut self, rows: &[ObservedRow]) -> CycleOutcome {
        let locations = match detect::detect_change(&self.state.previous_locations, rows) {
            ChangeOutcome::NoSlots => {
                self.state.log("No recent slots", Severity::Info);
                return CycleOutcome::NoSlots;
            }
            ChangeOutcome::Unchanged => {
                self.state.log("Same locations, no alert", Severity::Info);
                return CycleOutcome::Unchanged;
            }
            ChangeOutcome::NewTrigger(locations) => locations,
        };

        self.state.log(
            format!(
                "Prev: [{}] Curr: [{}]",
                display_locations(&self.state.previous_locations),
                display_locations(&locations)
            ),
            Severity::Info,
        );
        self.state.previous_locations = locations.clone();

        let decision = policy::evaluate(self.state.phase, rows);
        self.state.log(
            format!("Phase {}: {}", self.state.phase, decision.reason),
            Severity::Info,
        );

        if !decision.should_alert {
            self.state.log("Alert skipped", Severity::Warning);
            return CycleOutcome::Suppressed {
                locations,
                reason: decision.reason,
            };
        }

        self.state.log("ALERT TRIGGERED", Severity::Alert);
        let alert = Alert::slots(
            rows,
            self.state.email.as_deref(),
            self.extractor.target_url(),
        );
        let channels = self.dispatch(alert);
        CycleOutcome::Alerted {
            locations,
            channels,
        }
    }

    /// Send a synthetic alert through every channel without running a check
    pub fn test_alert(&mut self) -> Vec<Channel> {
        self.state.log("Testing alert", Severity::Alert);
        if self.state.email.is_none() {
            self.state.log("No email configured", Severity::Warning);
        }
        let alert = Alert::test(self.state.email.as_deref());
        self.dispatch(alert)
    }

    fn dispatch(&mut self, alert: Alert) -> Vec<Channel> {
        if let Some(email) = &alert.email {
            if self.dispatcher.has_channel(Channel::Email) {
                self.state
                    .log(format!("Sending email to {}", email.to), Severity::Info);
            } else {
                self.state
                    .log("Email delivery is not configured", Severity::Warning);
            }
        }
        self.dispatcher.dispatch(alert)
    }

    /// Record the outcome of a delivery started earlier
    pub fn record_delivery(&mut self, report: DeliveryReport) {
        let kind = if report.is_test { "Test alert" } else { "Alert" };
        match report.result {
            Ok(()) => self.state.log(
                format!("{} delivered via {}", kind, report.channel),
                Severity::Success,
            ),
            Err(e) => self.state.log(
                format!("{} via {} failed: {}", kind, report.channel, e),
                Severity::Warning,
            ),
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.state.mode = mode;
        self.state.log(format!("Mode set to {}", mode), Severity::Info);
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
        self.state.log(format!("Phase set to {}", phase), Severity::Info);
    }

    /// Set the alert recipient. A blank address clears it; a malformed one
    /// is rejected and the current address kept.
    pub fn set_email(&mut self, email: Option<String>) -> crate::Result<()> {
        let email = match normalize_email(email) {
            Ok(email) => email,
            Err(e) => {
                self.state.log(e.to_string(), Severity::Warning);
                return Err(e);
            }
        };
        match &email {
            Some(address) => self
                .state
                .log(format!("Email set to {}", address), Severity::Info),
            None => self.state.log("Email cleared", Severity::Info),
        }
        self.state.email = email;
        Ok(())
    }

    /// Record a problem reported by the surrounding service
    pub fn log(&mut self, message: impl Into<String>, severity: Severity) {
        self.state.log(message, severity);
    }
}

fn display_locations(locations: &[String]) -> String {
    if locations.is_empty() {
        "none".to_string()
    } else {
        locations.join(", ")
    }
}
