//! Desktop notification channel

use async_trait::async_trait;

use crate::config::DesktopConfig;
use crate::notifier::{Alert, Channel, Notifier};

/// Shows alerts through the platform notification service
#[derive(Debug)]
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(config: &DesktopConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn channel(&self) -> Channel {
        Channel::Desktop
    }

    async fn notify(&self, alert: &Alert) -> crate::Result<()> {
        let app_name = self.app_name.clone();
        let summary = alert.title.clone();
        let body = alert.message.clone();

        // notify-rust blocks on the session bus
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .appname(&app_name)
                .summary(&summary)
                .body(&body)
                .show()
                .map(|_| ())
        })
        .await
        .map_err(|e| crate::SlotWatchError::Notifier(format!("notification task failed: {}", e)))?
        .map_err(|e| crate::SlotWatchError::Notifier(format!("desktop notification failed: {}", e)))
    }
}
