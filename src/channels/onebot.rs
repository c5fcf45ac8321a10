//! OneBot chat-bot relay adapter.
//!
//! Forwards a message as a private chat message through a OneBot v11 HTTP
//! API (`POST /send_private_msg`). One request per delivery, bounded
//! timeout, no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChannelAdapter, DeliveryOutcome};
use crate::config::OneBotConfig;
use crate::message::Message;

/// Per-call timeout for the outbound API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers messages to a OneBot-compatible bot API.
pub struct OneBotAdapter {
    config: OneBotConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl OneBotAdapter {
    /// Create an adapter from its channel configuration, with the default
    /// request timeout.
    pub fn new(config: OneBotConfig) -> Self {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Create an adapter with a custom request timeout. A hung downstream
    /// degrades to `Failed` once the timeout elapses.
    pub fn with_timeout(config: OneBotConfig, timeout: Duration) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendPrivateMsg<'a> {
    user_id: i64,
    message: &'a str,
}

/// OneBot API response envelope. `wording` is the human-readable failure
/// text on newer implementations, `msg` the older field.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    retcode: i64,
    #[serde(default)]
    wording: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

#[async_trait]
impl ChannelAdapter for OneBotAdapter {
    fn name(&self) -> &'static str {
        "onebot"
    }

    async fn deliver(&self, message: &Message) -> DeliveryOutcome {
        if !self.config.is_ready() {
            return DeliveryOutcome::Skipped;
        }
        let Some(user_id) = self.config.target_id else {
            return DeliveryOutcome::Skipped;
        };

        let url = format!(
            "{}/send_private_msg",
            self.config.api_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .timeout(self.timeout)
            .json(&SendPrivateMsg {
                user_id,
                message: &message.text,
            })
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "OneBot request failed");
                return DeliveryOutcome::Failed("network error".to_string());
            }
        };

        let parsed = match response.json::<ApiResponse>().await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "OneBot response did not parse");
                return DeliveryOutcome::Failed("malformed response".to_string());
            }
        };

        match parsed.status.as_str() {
            "ok" | "async" => DeliveryOutcome::Delivered,
            _ => {
                let reason = parsed
                    .wording
                    .or(parsed.msg)
                    .unwrap_or_else(|| format!("retcode {}", parsed.retcode));
                tracing::warn!(reason = %reason, "OneBot reported delivery failure");
                DeliveryOutcome::Failed(reason)
            }
        }
    }
}
