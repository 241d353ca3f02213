//! Slotwatch - visa appointment slot monitor
//!
//! Polls a public availability page, detects newly appearing locations, and
//! raises desktop, speech and email alerts.

pub mod config;
pub mod dashboard;
pub mod desktop;
pub mod detect;
pub mod dispatch;
pub mod emailjs;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod filter;
pub mod io;
pub mod model;
pub mod monitor;
pub mod notifier;
pub mod policy;
pub mod schedule;
pub mod settings;
pub mod speech;
pub mod state;

pub use config::{load_config, Config};
pub use engine::{Engine, EngineOptions, MonitorHandle};
pub use error::{Result, SlotWatchError};
pub use model::{Mode, ObservedRow, Phase};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::desktop::DesktopNotifier;
use crate::emailjs::EmailJsNotifier;
use crate::extractor::{HttpPageExtractor, PageExtractor};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::Notifier;
use crate::settings::SettingsStore;
use crate::speech::SpeechNotifier;

/// Assembles a [`SlotWatch`] service, with each collaborator replaceable
pub struct SlotWatchBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    extractor: Option<Arc<dyn PageExtractor>>,
    notifiers: Option<Vec<Arc<dyn Notifier>>>,
    settings: Option<SettingsStore>,
    cancel: Option<CancellationToken>,
    auto_start: Option<(Option<Mode>, Option<Phase>)>,
}

impl SlotWatchBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            extractor: None,
            notifiers: None,
            settings: None,
            cancel: None,
            auto_start: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_notifiers(mut self, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        self.notifiers = Some(notifiers);
        self
    }

    pub fn with_settings_store(mut self, settings: SettingsStore) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Begin a session as soon as the service starts, optionally overriding
    /// the persisted mode and phase
    pub fn start_immediately(mut self, mode: Option<Mode>, phase: Option<Phase>) -> Self {
        self.auto_start = Some((mode, phase));
        self
    }

    pub fn build(self) -> Result<SlotWatch> {
        self.config.validate()?;

        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::with_timeout(Duration::from_secs(
                self.config.target.request_timeout_seconds,
            ))?),
        };

        let extractor = self.extractor.unwrap_or_else(|| {
            Arc::new(HttpPageExtractor::new(
                self.config.target.url.clone(),
                Arc::clone(&http),
            ))
        });

        let notifiers = self
            .notifiers
            .unwrap_or_else(|| build_notifiers(&self.config, &http));

        let settings = self
            .settings
            .unwrap_or_else(|| SettingsStore::new(self.config.resolved_settings_path()));
        if let Some(path) = settings.path() {
            tracing::debug!("Settings file: {}", path.display());
        }

        let cancel = self.cancel.unwrap_or_else(CancellationToken::new);
        let (engine, handle) = Engine::new(
            EngineOptions::from_config(&self.config),
            extractor,
            notifiers,
            settings,
            cancel.clone(),
        );

        Ok(SlotWatch {
            engine,
            handle,
            cancel,
            dashboard: self.config.dashboard.clone(),
            auto_start: self.auto_start,
        })
    }
}

fn build_notifiers(config: &Config, http: &Arc<dyn HttpClient>) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    if config.desktop.enabled {
        notifiers.push(Arc::new(DesktopNotifier::new(&config.desktop)));
    }
    if config.speech.enabled {
        notifiers.push(Arc::new(SpeechNotifier::new(&config.speech)));
    }
    match &config.email {
        Some(email) => notifiers.push(Arc::new(EmailJsNotifier::new(email, Arc::clone(http)))),
        None => tracing::info!("EmailJS not configured, email alerts disabled"),
    }
    notifiers
}

/// A built service, ready to run
pub struct SlotWatch {
    engine: Engine,
    handle: MonitorHandle,
    cancel: CancellationToken,
    dashboard: config::DashboardConfig,
    auto_start: Option<(Option<Mode>, Option<Phase>)>,
}

impl SlotWatch {
    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    /// Run the monitor loop and dashboard until ctrl-c or cancellation
    pub async fn start(self) -> Result<()> {
        let cancel_for_signal = self.cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                return;
            }
            tracing::info!("Shutdown signal received");
            cancel_for_signal.cancel();
        });

        self.run().await
    }

    /// Run until the cancellation token fires
    pub async fn run(self) -> Result<()> {
        if self.dashboard.enabled {
            spawn_dashboard(self.handle.clone(), self.dashboard.port, self.cancel.clone());
        }

        let engine = tokio::spawn(self.engine.run());

        if let Some((mode, phase)) = self.auto_start {
            self.handle.start(mode, phase).await?;
        }

        tracing::info!("Slot monitor started");
        if let Err(e) = engine.await {
            tracing::error!("Monitor loop panicked: {}", e);
            return Err(SlotWatchError::EngineStopped);
        }
        tracing::info!("Slot monitor stopped");
        Ok(())
    }
}

fn spawn_dashboard(handle: MonitorHandle, port: u16, cancel: CancellationToken) {
    tokio::spawn(async move {
        let router = dashboard::build_router(handle);
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(
                    "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                    port,
                    e
                );
                return;
            }
        };
        tracing::info!("Dashboard listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await
        {
            tracing::error!("{}", SlotWatchError::Dashboard(e.to_string()));
        }

        tracing::debug!("Dashboard stopped");
    });
}
