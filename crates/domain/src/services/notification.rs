//! Notification sink for registration lifecycle events.
//!
//! Notifications are best-effort: they fire after the transaction outcome
//! is already durable, and a sink failure never rolls a registration back.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ContactInfo, Project, Registration};

/// Confirmation payload for a successful signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationNotice {
    pub registration_id: i64,
    pub project_id: i64,
    pub project_title: String,
    pub project_date: NaiveDate,
    pub location_address: String,
    pub guest_count: i32,
    pub contact: ContactInfo,
}

impl RegistrationNotice {
    pub fn new(project: &Project, registration: &Registration) -> Self {
        Self {
            registration_id: registration.id,
            project_id: project.id,
            project_title: project.title.clone(),
            project_date: project.project_date,
            location_address: project.location_address.clone(),
            guest_count: registration.guest_count,
            contact: registration.contact.clone(),
        }
    }
}

/// Confirmation payload for a cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CancellationNotice {
    pub registration_id: i64,
    pub project_id: i64,
    pub project_title: String,
    pub contact: ContactInfo,
}

impl CancellationNotice {
    pub fn new(project: &Project, registration: &Registration) -> Self {
        Self {
            registration_id: registration.id,
            project_id: project.id,
            project_title: project.title.clone(),
            contact: registration.contact.clone(),
        }
    }
}

/// Result of a notification send attempt.
#[derive(Debug, Clone)]
pub enum NotificationResult {
    /// Notification was sent successfully.
    Sent,
    /// No contact email on file to deliver to.
    NoRecipient,
    /// Sending failed (non-blocking, logged only).
    Failed(String),
    /// Sending is disabled in this deployment.
    Skipped,
}

/// Sink for outbound registration/cancellation confirmations.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a signup confirmation.
    async fn registration_confirmed(&self, notice: RegistrationNotice) -> NotificationResult;

    /// Deliver a cancellation confirmation.
    async fn registration_cancelled(&self, notice: CancellationNotice) -> NotificationResult;
}

/// Mock notification sink for development and testing.
///
/// Logs notifications and counts deliveries but doesn't send anything.
#[derive(Debug, Default)]
pub struct MockNotificationSink {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: AtomicUsize,
}

impl MockNotificationSink {
    /// Create a new mock notification sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sink that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            sent: AtomicUsize::new(0),
        }
    }

    /// Number of notifications delivered so far.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NotificationSink for MockNotificationSink {
    async fn registration_confirmed(&self, notice: RegistrationNotice) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                registration_id = notice.registration_id,
                project_id = notice.project_id,
                "Mock notification sink simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            registration_id = notice.registration_id,
            project_id = notice.project_id,
            project_title = %notice.project_title,
            guest_count = notice.guest_count,
            "Mock: Would send registration confirmation"
        );
        self.sent.fetch_add(1, Ordering::SeqCst);
        NotificationResult::Sent
    }

    async fn registration_cancelled(&self, notice: CancellationNotice) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                registration_id = notice.registration_id,
                project_id = notice.project_id,
                "Mock notification sink simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            registration_id = notice.registration_id,
            project_id = notice.project_id,
            project_title = %notice.project_title,
            "Mock: Would send cancellation confirmation"
        );
        self.sent.fetch_add(1, Ordering::SeqCst);
        NotificationResult::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn test_mock_sink_send() {
        let sink = MockNotificationSink::new();
        let result = sink.registration_confirmed(notice()).await;
        assert!(matches!(result, NotificationResult::Sent));
        assert_eq!(sink.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_sink_failure() {
        let sink = MockNotificationSink::failing();
        let result = sink.registration_confirmed(notice()).await;
        assert!(matches!(result, NotificationResult::Failed(_)));
        assert_eq!(sink.sent_count(), 0);
    }

    #[test]
    fn test_notice_serialization() {
        let json = serde_json::to_string(&notice()).unwrap();
        assert!(json.contains("Park cleanup"));
        assert!(json.contains("\"guest_count\":2"));
    }
}
