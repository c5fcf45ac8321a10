//! SMTP email relay adapter.
//!
//! Sends each accepted message as a single email with a fixed subject over
//! a TLS session. The transport lives only for the duration of one
//! delivery, so the session is released on every exit path.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{ChannelAdapter, DeliveryOutcome};
use crate::config::EmailConfig;
use crate::message::Message;

/// Fixed subject line for relayed notifications.
const SUBJECT: &str = "Webhook notification";

/// Bound on the whole SMTP exchange (connect, auth, send).
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers messages through a configured SMTP relay.
pub struct EmailAdapter {
    config: EmailConfig,
}

impl EmailAdapter {
    /// Create an adapter from its channel configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChannelAdapter for EmailAdapter {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, message: &Message) -> DeliveryOutcome {
        if !self.config.is_ready() {
            return DeliveryOutcome::Skipped;
        }

        let from: Mailbox = match self.config.from.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => return DeliveryOutcome::Failed(format!("invalid from address: {e}")),
        };
        let to: Mailbox = match self.config.to.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => return DeliveryOutcome::Failed(format!("invalid to address: {e}")),
        };

        let mail = match lettre::Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .body(message.text.clone())
        {
            Ok(mail) => mail,
            Err(e) => return DeliveryOutcome::Failed(format!("failed to build message: {e}")),
        };

        let transport = match AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host) {
            Ok(builder) => builder
                .port(self.config.smtp_port)
                .credentials(Credentials::new(
                    self.config.username.clone(),
                    self.config.password.clone(),
                ))
                .timeout(Some(SEND_TIMEOUT))
                .build(),
            Err(e) => return DeliveryOutcome::Failed(format!("smtp setup failed: {e}")),
        };

        match transport.send(mail).await {
            Ok(_) => DeliveryOutcome::Delivered,
            Err(e) => {
                tracing::warn!(error = %e, "Email delivery failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "relay@example.com".to_string(),
            to: "inbox@example.com".to_string(),
        }
    }

    fn test_message() -> Message {
        Message {
            text: "hello".to_string(),
            sender_label: "alice".to_string(),
            received_at: chrono::Local::now(),
        }
    }

    #[tokio::test]
    async fn disabled_channel_is_skipped() {
        let mut config = ready_config();
        config.enabled = false;
        let adapter = EmailAdapter::new(config);
        assert_eq!(
            adapter.deliver(&test_message()).await,
            DeliveryOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn missing_fields_are_skipped() {
        for strip in ["host", "port", "username", "password", "from", "to"] {
            let mut config = ready_config();
            match strip {
                "host" => config.smtp_host = String::new(),
                "port" => config.smtp_port = 0,
                "username" => config.username = String::new(),
                "password" => config.password = String::new(),
                "from" => config.from = String::new(),
                _ => config.to = String::new(),
            }
            let adapter = EmailAdapter::new(config);
            assert_eq!(
                adapter.deliver(&test_message()).await,
                DeliveryOutcome::Skipped,
                "expected skip when {strip} is missing"
            );
        }
    }

    #[tokio::test]
    async fn invalid_from_address_fails_without_connecting() {
        let mut config = ready_config();
        config.from = "not an address".to_string();
        let adapter = EmailAdapter::new(config);
        match adapter.deliver(&test_message()).await {
            DeliveryOutcome::Failed(reason) => assert!(reason.contains("invalid from address")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_fails() {
        // Bind then drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = ready_config();
        config.smtp_host = "127.0.0.1".to_string();
        config.smtp_port = addr.port();
        let adapter = EmailAdapter::new(config);
        assert!(matches!(
            adapter.deliver(&test_message()).await,
            DeliveryOutcome::Failed(_)
        ));
    }
}
