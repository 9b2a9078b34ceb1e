use std::time::Duration;

use anyhow::Context as _;
use uuid::Uuid;

use crate::domain::repository::{AnalyticsPort, MailerPort};
use crate::domain::types::{HostAlert, RegistrationEmail};

/// HTTP client for the notifier collaborator: transactional mail and the
/// registration analytics feed. Called only from detached side-effect
/// tasks, never on a response path.
#[derive(Clone)]
pub struct HttpNotifier {
    http: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    pub fn new(base_url: String) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build notifier HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

impl MailerPort for HttpNotifier {
    async fn send_registration_email(
        &self,
        email: RegistrationEmail,
    ) -> Result<(), anyhow::Error> {
        self.http
            .post(self.url("/emails/registration"))
            .json(&email)
            .send()
            .await
            .context("send registration email")?
            .error_for_status()
            .context("registration email rejected")?;
        Ok(())
    }

    async fn send_host_alert(&self, alert: HostAlert) -> Result<(), anyhow::Error> {
        self.http
            .post(self.url("/emails/host-alert"))
            .json(&alert)
            .send()
            .await
            .context("send host alert")?
            .error_for_status()
            .context("host alert rejected")?;
        Ok(())
    }
}

impl AnalyticsPort for HttpNotifier {
    async fn record_registration(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        quantity: u32,
    ) -> Result<(), anyhow::Error> {
        self.http
            .post(self.url("/analytics/registrations"))
            .json(&serde_json::json!({
                "user_id": user_id,
                "event_id": event_id,
                "quantity": quantity,
            }))
            .send()
            .await
            .context("record registration analytics")?
            .error_for_status()
            .context("registration analytics rejected")?;
        Ok(())
    }
}
