//! Notification channel adapters and the fan-out delivery coordinator.
//!
//! Each adapter encapsulates delivery of one message to one external
//! system (OneBot chat-bot relay, SMTP email). The coordinator invokes the
//! active set of adapters for every accepted message and aggregates their
//! independent outcomes into a single result.
//!
//! ```text
//!                    ┌──────────────────────┐
//!   Message ────────▶│ DeliveryCoordinator  │
//!                    └──────────┬───────────┘
//!                     spawn     │     spawn
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//!      ┌──────────────┐                  ┌──────────────┐
//!      │ OneBotAdapter│                  │ EmailAdapter │
//!      └──────┬───────┘                  └──────┬───────┘
//!             └────────────┬───────────────────┘
//!                          ▼  (full barrier)
//!                   AggregatedResult
//! ```

mod coordinator;
mod email;
mod onebot;

pub use coordinator::{AggregatedResult, DeliveryCoordinator, Overall};
pub use email::EmailAdapter;
pub use onebot::OneBotAdapter;

use async_trait::async_trait;

use crate::message::Message;

/// Outcome of one delivery attempt on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Channel disabled or not fully configured; nothing was attempted.
    /// Benign, not a failure.
    Skipped,
    /// Message handed off to the downstream system.
    Delivered,
    /// Delivery was attempted and failed. Reported, never raised.
    Failed(String),
}

impl DeliveryOutcome {
    /// Status word used in the HTTP `details` map.
    pub fn status_word(&self) -> &'static str {
        match self {
            DeliveryOutcome::Skipped => "disabled",
            DeliveryOutcome::Delivered => "success",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }

    /// Whether this outcome counts against the aggregated result.
    pub fn is_failure(&self) -> bool {
        matches!(self, DeliveryOutcome::Failed(_))
    }
}

/// A delivery strategy for one external notification channel.
///
/// Adapters are stateless per call: they hold only their own connection
/// configuration and never retain the message. Every failure mode is
/// captured as a [`DeliveryOutcome`]; nothing escapes the adapter boundary.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Stable channel name, used as the key in aggregated results.
    fn name(&self) -> &'static str;

    /// Attempt to deliver one message. No retries.
    async fn deliver(&self, message: &Message) -> DeliveryOutcome;
}
