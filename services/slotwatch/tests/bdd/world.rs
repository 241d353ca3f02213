//! BDD test world for the slot monitor

use std::sync::Arc;

use cucumber::World;
use slotwatch::dispatch::DeliveryReport;
use slotwatch::monitor::{CycleOutcome, SlotMonitor};
use slotwatch::notifier::Channel;
use tokio::sync::mpsc;

use crate::common::{RecordingNotifier, ScriptedExtractor};

#[derive(Debug, Default, World)]
pub struct SlotWatchWorld {
    pub monitor: Option<SlotMonitor>,
    pub extractor: Option<Arc<ScriptedExtractor>>,
    pub reports: Option<mpsc::UnboundedReceiver<DeliveryReport>>,

    // Channels handed to the dispatcher
    pub desktop: Option<Arc<RecordingNotifier>>,
    pub speech: Option<Arc<RecordingNotifier>>,
    pub email: Option<Arc<RecordingNotifier>>,

    pub last_outcome: Option<CycleOutcome>,
    /// Channels started by the latest dispatch and not yet settled
    pub dispatched: Vec<Channel>,
    pub alert_count: usize,
    pub start_result: Option<bool>,
}

impl SlotWatchWorld {
    pub fn monitor(&mut self) -> &mut SlotMonitor {
        self.monitor.as_mut().expect("monitor not created")
    }

    pub fn extractor(&self) -> &ScriptedExtractor {
        self.extractor.as_deref().expect("monitor not created")
    }
}
