//! Engine: the single task that owns the monitor state and drives checks
//!
//! Commands from the dashboard arrive on an mpsc queue and are applied as
//! they come, including while a page request is in flight. A stop drops the
//! request and any retry timer. Exactly one deadline exists at a time; the
//! displayed countdown is derived from it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::dispatch::{AlertDispatcher, DeliveryReport};
use crate::extractor::{Extraction, PageExtractor};
use crate::model::{Mode, Phase};
use crate::monitor::SlotMonitor;
use crate::notifier::Notifier;
use crate::schedule::{IntervalPolicy, RetryPolicy};
use crate::settings::{Settings, SettingsStore};
use crate::state::{MonitorSnapshot, MonitorState, Severity};

const COMMAND_QUEUE_SIZE: usize = 32;

type PendingExtraction = Pin<Box<dyn Future<Output = crate::Result<Extraction>> + Send>>;

/// Timing and sizing knobs for the engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub intervals: IntervalPolicy,
    pub retry: RetryPolicy,
    pub warmup: Duration,
    pub log_capacity: usize,
    /// Fixed RNG seed for the SLOW interval; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            intervals: IntervalPolicy::from_config(&config.schedule),
            retry: RetryPolicy::from_config(&config.target),
            warmup: Duration::from_secs(config.target.warmup_seconds),
            log_capacity: config.log_capacity,
            seed: None,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug)]
enum Command {
    Start {
        mode: Option<Mode>,
        phase: Option<Phase>,
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SetMode {
        mode: Mode,
        reply: oneshot::Sender<()>,
    },
    SetPhase {
        phase: Phase,
        reply: oneshot::Sender<()>,
    },
    SetEmail {
        email: Option<String>,
        reply: oneshot::Sender<crate::Result<()>>,
    },
    TestAlert {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle for issuing commands and reading the latest state
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<MonitorState>,
}

impl MonitorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> crate::Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| crate::SlotWatchError::EngineStopped)?;
        response
            .await
            .map_err(|_| crate::SlotWatchError::EngineStopped)
    }

    /// Start a session. Returns false if one was already running.
    pub async fn start(&self, mode: Option<Mode>, phase: Option<Phase>) -> crate::Result<bool> {
        self.request(|reply| Command::Start { mode, phase, reply })
            .await
    }

    pub async fn stop(&self) -> crate::Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn set_mode(&self, mode: Mode) -> crate::Result<()> {
        self.request(|reply| Command::SetMode { mode, reply }).await
    }

    pub async fn set_phase(&self, phase: Phase) -> crate::Result<()> {
        self.request(|reply| Command::SetPhase { phase, reply })
            .await
    }

    /// Set or clear (with `None` or a blank string) the alert recipient.
    /// Fails with [`crate::SlotWatchError::InvalidEmail`] for a malformed address.
    pub async fn set_email(&self, email: Option<String>) -> crate::Result<()> {
        self.request(|reply| Command::SetEmail { email, reply })
            .await?
    }

    pub async fn test_alert(&self) -> crate::Result<()> {
        self.request(|reply| Command::TestAlert { reply }).await
    }

    /// Snapshot of the most recently published state
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.state.borrow().snapshot(Instant::now())
    }
}

/// The monitor loop
pub struct Engine {
    monitor: SlotMonitor,
    extractor: Arc<dyn PageExtractor>,
    /// Page request of the running cycle
    extraction: Option<PendingExtraction>,
    /// Backoff deadline between a failed request and its retry
    retry_at: Option<Instant>,
    retries: u32,
    cycle_mode: Mode,
    intervals: IntervalPolicy,
    warmup: Duration,
    rng: StdRng,
    settings: SettingsStore,
    commands: mpsc::Receiver<Command>,
    reports: mpsc::UnboundedReceiver<DeliveryReport>,
    published: watch::Sender<MonitorState>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        options: EngineOptions,
        extractor: Arc<dyn PageExtractor>,
        notifiers: Vec<Arc<dyn Notifier>>,
        settings: SettingsStore,
        cancel: CancellationToken,
    ) -> (Self, MonitorHandle) {
        let saved = match settings.load() {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Failed to load saved settings, using defaults: {}", e);
                Settings::default()
            }
        };

        let mut state = MonitorState::new(saved.mode, saved.phase, options.log_capacity);
        state.email = saved.email;

        let (report_tx, reports) = mpsc::unbounded_channel();
        let dispatcher = AlertDispatcher::new(notifiers, report_tx);
        let cycle_mode = state.mode;
        let monitor = SlotMonitor::new(state, Arc::clone(&extractor), dispatcher, options.retry);

        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let (published, state_rx) = watch::channel(monitor.state().clone());

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let engine = Self {
            monitor,
            extractor,
            extraction: None,
            retry_at: None,
            retries: 0,
            cycle_mode,
            intervals: options.intervals,
            warmup: options.warmup,
            rng,
            settings,
            commands,
            reports,
            published,
            cancel,
        };
        let handle = MonitorHandle {
            commands: command_tx,
            state: state_rx,
        };
        (engine, handle)
    }

    /// Run until cancelled or every handle is dropped
    pub async fn run(mut self) {
        tracing::debug!("Monitor loop started for {}", self.monitor.target_url());

        loop {
            let deadline = self.retry_at.or(self.monitor.state().next_check_at);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Monitor loop cancelled");
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => {
                        tracing::debug!("All monitor handles dropped");
                        break;
                    }
                },
                Some(report) = self.reports.recv() => self.monitor.record_delivery(report),
                result = next_extraction(&mut self.extraction) => {
                    self.extraction = None;
                    self.finish_attempt(result);
                }
                _ = wait_for(deadline) => self.deadline_reached(),
            }

            self.publish();
        }
    }

    /// Apply a command. State is published before the reply so callers
    /// observe their own change.
    fn handle(&mut self, command: Command) {
        match command {
            Command::Start { mode, phase, reply } => {
                let started = self.monitor.start(mode, phase, self.warmup, Instant::now());
                if started {
                    self.persist();
                }
                self.publish();
                let _ = reply.send(started);
            }
            Command::Stop { reply } => {
                self.abandon_cycle();
                self.monitor.stop();
                self.publish();
                let _ = reply.send(());
            }
            Command::SetMode { mode, reply } => {
                self.monitor.set_mode(mode);
                self.persist();
                self.publish();
                let _ = reply.send(());
            }
            Command::SetPhase { phase, reply } => {
                self.monitor.set_phase(phase);
                self.persist();
                self.publish();
                let _ = reply.send(());
            }
            Command::SetEmail { email, reply } => {
                let result = self.monitor.set_email(email);
                if result.is_ok() {
                    self.persist();
                }
                self.publish();
                let _ = reply.send(result);
            }
            Command::TestAlert { reply } => {
                self.monitor.test_alert();
                self.publish();
                let _ = reply.send(());
            }
        }
    }

    fn deadline_reached(&mut self) {
        if self.retry_at.take().is_some() {
            self.launch_extraction();
            return;
        }
        if !self.monitor.begin_check() {
            return;
        }
        self.retries = 0;
        self.cycle_mode = self.monitor.state().mode;
        self.launch_extraction();
    }

    fn launch_extraction(&mut self) {
        let extractor = Arc::clone(&self.extractor);
        let mode = self.cycle_mode;
        let request: PendingExtraction = Box::pin(async move { extractor.extract(mode).await });
        self.extraction = Some(request);
    }

    fn finish_attempt(&mut self, result: crate::Result<Extraction>) {
        if let Err(e) = &result {
            if let Some(delay) = self.monitor.plan_retry(e, self.retries) {
                self.retries += 1;
                self.retry_at = Some(Instant::now() + delay);
                return;
            }
        }

        let outcome = self.monitor.finish_check(result);
        tracing::debug!("Check finished: {:?}", outcome);

        if self.monitor.state().is_running() {
            let interval = self
                .intervals
                .next_interval(self.monitor.state().mode, &mut self.rng);
            self.monitor.schedule_next(interval, Instant::now());
        }
    }

    /// Drop the in-flight request and any pending retry
    fn abandon_cycle(&mut self) {
        let request = self.extraction.take();
        let retry = self.retry_at.take();
        if request.is_some() || retry.is_some() {
            tracing::debug!("In-flight check abandoned");
        }
    }

    fn persist(&mut self) {
        let state = self.monitor.state();
        let settings = Settings {
            mode: state.mode,
            phase: state.phase,
            email: state.email.clone(),
        };
        if let Err(e) = self.settings.save(&settings) {
            let message = format!("Failed to save settings: {}", e);
            self.monitor.log(message, Severity::Warning);
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.monitor.state().clone());
    }
}

async fn next_extraction(pending: &mut Option<PendingExtraction>) -> crate::Result<Extraction> {
    match pending {
        Some(extraction) => extraction.await,
        None => std::future::pending().await,
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
