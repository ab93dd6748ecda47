//! Email notification sink.
//!
//! Implements the domain notification sink over an email provider:
//! - `console`: logs the rendered email (development)
//! - `sendgrid`: delivers via the SendGrid API
//!
//! Delivery is best-effort by contract: failures are logged and reported as
//! a non-blocking result, never as an error to the registration path.

use std::sync::Arc;
use std::time::Duration;

use domain::services::{
    CancellationNotice, NotificationResult, NotificationSink, RegistrationNotice,
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::EmailConfig;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Email-backed [`NotificationSink`].
#[derive(Clone)]
pub struct EmailNotifier {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailNotifier {
    /// Creates a new EmailNotifier with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            config: Arc::new(config),
            client,
        }
    }

    async fn send(&self, to: &str, to_name: &str, subject: &str, body: &str) -> NotificationResult {
        if !self.config.enabled {
            debug!(to = %to, subject = %subject, "Email sending disabled, skipping");
            return NotificationResult::Skipped;
        }

        match self.config.provider.as_str() {
            "console" => {
                info!(
                    to = %to,
                    subject = %subject,
                    body = %body,
                    "Console email provider: would send"
                );
                NotificationResult::Sent
            }
            "sendgrid" => self.send_sendgrid(to, to_name, subject, body).await,
            provider => {
                warn!(provider = %provider, "Unknown email provider");
                NotificationResult::Failed(format!("Unknown email provider: {}", provider))
            }
        }
    }

    async fn send_sendgrid(
        &self,
        to: &str,
        to_name: &str,
        subject: &str,
        body: &str,
    ) -> NotificationResult {
        let payload = json!({
            "personalizations": [{
                "to": [{ "email": to, "name": to_name }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }]
        });

        let result = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => NotificationResult::Sent,
            Ok(response) => {
                let status = response.status();
                warn!(to = %to, status = %status, "SendGrid rejected email");
                NotificationResult::Failed(format!("SendGrid returned {}", status))
            }
            Err(err) => {
                warn!(to = %to, error = %err, "SendGrid request failed");
                NotificationResult::Failed(err.to_string())
            }
        }
    }
}

fn render_registration(notice: &RegistrationNotice) -> (String, String) {
    let subject = format!("You're signed up: {}", notice.project_title);
    let guests = match notice.guest_count {
        0 => String::new(),
        1 => "\nYou're bringing 1 guest.".to_string(),
        n => format!("\nYou're bringing {} guests.", n),
    };
    let body = format!(
        "Hi {},\n\n\
         You're confirmed for {} on {}.\n\
         Location: {}{}\n\n\
         Need to make a change? You can cancel or update your registration\n\
         any time before the event.\n\n\
         See you there!",
        notice.contact.display_name(),
        notice.project_title,
        notice.project_date.format("%B %-d, %Y"),
        notice.location_address,
        guests,
    );
    (subject, body)
}

fn render_cancellation(notice: &CancellationNotice) -> (String, String) {
    let subject = format!("Registration cancelled: {}", notice.project_title);
    let body = format!(
        "Hi {},\n\n\
         Your registration for {} has been cancelled and your spots have\n\
         been released. If this wasn't you, just sign up again.\n\n\
         Thanks for letting us know!",
        notice.contact.display_name(),
        notice.project_title,
    );
    (subject, body)
}

#[async_trait::async_trait]
impl NotificationSink for EmailNotifier {
    async fn registration_confirmed(&self, notice: RegistrationNotice) -> NotificationResult {
        let Some(ref to) = notice.contact.email else {
            debug!(
                registration_id = notice.registration_id,
                "No contact email on registration, skipping confirmation"
            );
            return NotificationResult::NoRecipient;
        };

        let (subject, body) = render_registration(&notice);
        self.send(to, &notice.contact.display_name(), &subject, &body)
            .await
    }

    async fn registration_cancelled(&self, notice: CancellationNotice) -> NotificationResult {
        let Some(ref to) = notice.contact.email else {
            debug!(
                registration_id = notice.registration_id,
                "No contact email on registration, skipping cancellation notice"
            );
            return NotificationResult::NoRecipient;
        };

        let (subject, body) = render_cancellation(&notice);
        self.send(to, &notice.contact.display_name(), &subject, &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::models::ContactInfo;

    fn notice() -> RegistrationNotice {
        RegistrationNotice {
            registration_id: 1,
            project_id: 2,
            project_title: "Park cleanup".to_string(),
            project_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
            location_address: "100 Main St".to_string(),
            guest_count: 2,
            contact: ContactInfo {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                phone: None,
                text_permission: false,
            },
        }
    }

    #[test]
    fn test_render_registration() {
        let (subject, body) = render_registration(&notice());
        assert_eq!(subject, "You're signed up: Park cleanup");
        assert!(body.contains("Hi Jane Doe"));
        assert!(body.contains("September 12, 2026"));
        assert!(body.contains("100 Main St"));
        assert!(body.contains("2 guests"));
    }

    #[test]
    fn test_render_registration_no_guests() {
        let mut n = notice();
        n.guest_count = 0;
        let (_, body) = render_registration(&n);
        assert!(!body.contains("guest"));
    }

    #[test]
    fn test_render_cancellation() {
        let n = CancellationNotice {
            registration_id: 1,
            project_id: 2,
            project_title: "Park cleanup".to_string(),
            contact: notice().contact,
        };
        let (subject, body) = render_cancellation(&n);
        assert!(subject.contains("cancelled"));
        assert!(body.contains("Park cleanup"));
    }

    #[tokio::test]
    async fn test_disabled_sink_skips() {
        let sink = EmailNotifier::new(EmailConfig::default());
        let result = sink.registration_confirmed(notice()).await;
        assert!(matches!(result, NotificationResult::Skipped));
    }

    #[tokio::test]
    async fn test_missing_recipient() {
        let sink = EmailNotifier::new(EmailConfig {
            enabled: true,
            ..Default::default()
        });
        let mut n = notice();
        n.contact.email = None;
        let result = sink.registration_confirmed(n).await;
        assert!(matches!(result, NotificationResult::NoRecipient));
    }

    #[tokio::test]
    async fn test_console_provider_sends() {
        let sink = EmailNotifier::new(EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            ..Default::default()
        });
        let result = sink.registration_confirmed(notice()).await;
        assert!(matches!(result, NotificationResult::Sent));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_non_blocking() {
        let sink = EmailNotifier::new(EmailConfig {
            enabled: true,
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        });
        let result = sink.registration_confirmed(notice()).await;
        assert!(matches!(result, NotificationResult::Failed(_)));
    }
}
