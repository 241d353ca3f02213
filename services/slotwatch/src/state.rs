//! Monitor session state, bounded activity log and display snapshots

use std::collections::VecDeque;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::model::{Mode, Phase};

/// Where the monitor loop is in its cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Checking,
    Waiting,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::Checking => write!(f, "Checking"),
            RunState::Waiting => write!(f, "Waiting"),
        }
    }
}

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    Alert,
}

/// One entry of the user-facing activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`
    pub time: String,
    pub timestamp_epoch_ms: u64,
    pub message: String,
    pub severity: Severity,
}

/// Newest-first log that evicts its oldest entries past `capacity`
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry and mirror it to tracing
    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Info | Severity::Success => tracing::info!("{}", message),
            Severity::Warning | Severity::Alert => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }

        self.entries.push_front(LogEntry {
            time: chrono::Local::now().format("%H:%M:%S").to_string(),
            timestamp_epoch_ms: current_epoch_ms(),
            message,
            severity,
        });
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }
}

/// State of the single monitoring session, owned by the monitor loop
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub run_state: RunState,
    pub mode: Mode,
    pub phase: Phase,
    pub check_count: u64,
    /// Locations of the last check that matched at least one row
    pub previous_locations: Vec<String>,
    pub last_check_time: Option<String>,
    /// The one authoritative timer deadline for the next check
    pub next_check_at: Option<Instant>,
    pub email: Option<String>,
    pub logs: EventLog,
}

impl MonitorState {
    pub fn new(mode: Mode, phase: Phase, log_capacity: usize) -> Self {
        Self {
            run_state: RunState::Idle,
            mode,
            phase,
            check_count: 0,
            previous_locations: Vec::new(),
            last_check_time: None,
            next_check_at: None,
            email: None,
            logs: EventLog::new(log_capacity),
        }
    }

    pub fn is_running(&self) -> bool {
        self.run_state != RunState::Idle
    }

    /// Clear everything a fresh session starts without
    pub fn reset_session(&mut self) {
        self.check_count = 0;
        self.previous_locations.clear();
        self.last_check_time = None;
        self.logs.clear();
    }

    pub fn log(&mut self, message: impl Into<String>, severity: Severity) {
        self.logs.push(message, severity);
    }

    /// Point-in-time view for display, with the countdown derived from the deadline
    pub fn snapshot(&self, now: Instant) -> MonitorSnapshot {
        let next_check_in_secs = self.next_check_at.map(|deadline| {
            let remaining = deadline.saturating_duration_since(now);
            remaining.as_millis().div_ceil(1000) as u64
        });

        MonitorSnapshot {
            running: self.is_running(),
            state: self.run_state,
            mode: self.mode,
            phase: self.phase,
            check_count: self.check_count,
            previous_locations: self.previous_locations.clone(),
            last_check_time: self.last_check_time.clone(),
            next_check_in_secs,
            email: self.email.clone(),
            logs: self.logs.iter().cloned().collect(),
        }
    }
}

/// Read-only view handed to the control surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub running: bool,
    pub state: RunState,
    pub mode: Mode,
    pub phase: Phase,
    pub check_count: u64,
    pub previous_locations: Vec<String>,
    pub last_check_time: Option<String>,
    pub next_check_in_secs: Option<u64>,
    pub email: Option<String>,
    pub logs: Vec<LogEntry>,
}

pub(crate) fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
