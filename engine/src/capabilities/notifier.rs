//! Logging notifier
//!
//! A notifier backend that records every send in memory and logs it. Stands
//! in for SMTP or an email API in the CLI and in tests; the recorded sends
//! double as assertions material.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use sdk::capability::Notifier;
use sdk::errors::CapabilityError;

/// One recorded outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub from: String,
}

/// Notifier that logs and records instead of sending.
pub struct LogNotifier {
    sent: Mutex<Vec<SentMail>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Everything sent so far, oldest first.
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    /// Number of sends so far.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        from: &str,
    ) -> Result<(), CapabilityError> {
        info!(
            "Mail from {} to {} recipient(s): {}",
            from,
            to.len(),
            subject
        );

        self.sent.lock().await.push(SentMail {
            to: to.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
            from: from.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_is_recorded() {
        let notifier = LogNotifier::new();
        notifier
            .send(
                &["om@company.com".to_string()],
                "Hello",
                "Body",
                "lead@company.com",
            )
            .await
            .unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Hello");
        assert_eq!(sent[0].to, vec!["om@company.com"]);
    }
}
