//! Audio cue and speech channel
//!
//! Plays four terminal bells, speaks the configured phrase through an
//! external text-to-speech command, then plays two more bells.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::SpeechConfig;
use crate::notifier::{Alert, Channel, Notifier};

const BEEP_SPACING: Duration = Duration::from_millis(200);
const LEADING_BEEPS: usize = 4;
const TRAILING_BEEPS: usize = 2;

#[derive(Debug)]
pub struct SpeechNotifier {
    command: String,
    args: Vec<String>,
    phrase: String,
    beeps: bool,
}

impl SpeechNotifier {
    pub fn new(config: &SpeechConfig) -> Self {
        tracing::debug!("Created SpeechNotifier using '{}'", config.command);
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            phrase: config.phrase.clone(),
            beeps: config.beeps,
        }
    }

    async fn beep(&self, count: usize) {
        if !self.beeps {
            return;
        }
        for i in 0..count {
            if i > 0 {
                tokio::time::sleep(BEEP_SPACING).await;
            }
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }
    }

    async fn speak(&self) -> crate::Result<()> {
        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(&self.phrase)
            .status()
            .await
            .map_err(|e| {
                crate::SlotWatchError::Notifier(format!(
                    "failed to run speech command '{}': {}",
                    self.command, e
                ))
            })?;

        if !status.success() {
            return Err(crate::SlotWatchError::Notifier(format!(
                "speech command '{}' exited with {}",
                self.command, status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for SpeechNotifier {
    fn channel(&self) -> Channel {
        Channel::Speech
    }

    async fn notify(&self, _alert: &Alert) -> crate::Result<()> {
        self.beep(LEADING_BEEPS).await;
        let spoken = self.speak().await;
        self.beep(TRAILING_BEEPS).await;
        spoken
    }
}
