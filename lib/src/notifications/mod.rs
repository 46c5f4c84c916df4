// lib/src/notifications/mod.rs

//! Notification sink seam. Delivery (SMS, push, dashboard feed) is an
//! external collaborator; the core only asks that `notify` never blocks a
//! state transition. Callers swallow and log failures.

use async_trait::async_trait;
use log::info;
use models::{NotificationSeverity, NotificationTarget, RoutingResult};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        target: NotificationTarget,
        title: &str,
        message: &str,
        severity: NotificationSeverity,
        referral_id: Option<Uuid>,
    ) -> RoutingResult<()>;
}

/// Default sink: writes notifications to the log and nothing else. Useful
/// for tests and for deployments where the delivery channel is wired up
/// elsewhere.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        LogNotifier
    }
}

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(
        &self,
        target: NotificationTarget,
        title: &str,
        message: &str,
        severity: NotificationSeverity,
        referral_id: Option<Uuid>,
    ) -> RoutingResult<()> {
        info!(
            "notify [{:?}] -> {}: {} - {} (referral: {:?})",
            severity, target, title, message, referral_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_never_fails() {
        let sink = LogNotifier::new();
        let result = sink
            .notify(
                NotificationTarget::Doctor,
                "Referral accepted",
                "Your referral was accepted",
                NotificationSeverity::Info,
                Some(Uuid::new_v4()),
            )
            .await;
        assert!(result.is_ok());
    }
}
