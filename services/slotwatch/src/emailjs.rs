//! EmailJS email client

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmailJsConfig;
use crate::io::HttpClient;
use crate::notifier::{Alert, Channel, Notifier};

/// Email sender using the EmailJS REST API
pub struct EmailJsNotifier {
    service_id: String,
    template_id: String,
    public_key: String,
    api_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for EmailJsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsNotifier")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .finish()
    }
}

impl EmailJsNotifier {
    pub fn new(config: &EmailJsConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!(
            "Created EmailJsNotifier for service '{}'",
            config.service_id
        );

        Self {
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            public_key: config.public_key.clone(),
            api_url: config.api_url.clone(),
            http,
        }
    }
}

#[async_trait]
impl Notifier for EmailJsNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn notify(&self, alert: &Alert) -> crate::Result<()> {
        let Some(email) = &alert.email else {
            return Err(crate::SlotWatchError::Notifier(
                "no email address configured".to_string(),
            ));
        };

        let payload = serde_json::json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": {
                "to_email": email.to,
                "subject": email.subject,
                "message": email.body,
                "is_test": if email.is_test { "Yes" } else { "No" },
            }
        });

        tracing::debug!("Sending email to '{}': '{}'", email.to, email.subject);

        let response = self.http.post_json(&self.api_url, &payload).await?;

        if !response.is_success() {
            return Err(crate::SlotWatchError::Notifier(format!(
                "EmailJS returned status {}: {}",
                response.status, response.body
            )));
        }

        tracing::debug!("Email sent successfully");
        Ok(())
    }
}
