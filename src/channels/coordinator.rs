//! Fan-out delivery coordinator.
//!
//! Dispatches one message to every registered channel adapter, isolates
//! failures between channels, and aggregates the per-channel outcomes into
//! a single result for the caller. The coordinator never retries, queues,
//! or persists failed deliveries.

use std::sync::Arc;

use super::{ChannelAdapter, DeliveryOutcome};
use crate::message::Message;

/// Overall disposition of one fan-out dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overall {
    /// Every attempted delivery succeeded. Skipped channels are benign.
    AllSucceeded,
    /// At least one channel failed; the per-channel outcomes carry the
    /// detail. Never escalated to a hard failure of the ingestion request.
    PartialFailure,
}

/// Per-channel outcomes of one dispatch, in adapter registration order.
#[derive(Debug, Clone)]
pub struct AggregatedResult {
    outcomes: Vec<(&'static str, DeliveryOutcome)>,
}

impl AggregatedResult {
    /// Aggregation rule: `AllSucceeded` iff no outcome is `Failed`.
    pub fn overall(&self) -> Overall {
        if self.outcomes.iter().any(|(_, o)| o.is_failure()) {
            Overall::PartialFailure
        } else {
            Overall::AllSucceeded
        }
    }

    /// All per-channel outcomes.
    pub fn outcomes(&self) -> &[(&'static str, DeliveryOutcome)] {
        &self.outcomes
    }

    /// Outcome for a single channel, if it was registered.
    pub fn outcome(&self, channel: &str) -> Option<&DeliveryOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| *name == channel)
            .map(|(_, outcome)| outcome)
    }
}

/// Owns the failure-isolation contract for message fan-out.
pub struct DeliveryCoordinator {
    adapters: Vec<Arc<dyn ChannelAdapter>>,
}

impl DeliveryCoordinator {
    /// Create a coordinator over the active adapter set.
    pub fn new(adapters: Vec<Arc<dyn ChannelAdapter>>) -> Self {
        Self { adapters }
    }

    /// Deliver `message` to every registered adapter and wait for all
    /// outcomes before aggregating (full fan-out/fan-in barrier).
    ///
    /// Each adapter runs on its own task, so a panic inside one adapter
    /// cannot cancel or corrupt the others; a panicked adapter is reported
    /// as `Failed("unknown error")` for that channel only.
    pub async fn dispatch(&self, message: &Message) -> AggregatedResult {
        let mut handles = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let message = message.clone();
            let name = adapter.name();
            let handle = tokio::spawn(async move { adapter.deliver(&message).await });
            handles.push((name, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(channel = name, error = %e, "Channel adapter fault");
                    DeliveryOutcome::Failed("unknown error".to_string())
                }
            };
            outcomes.push((name, outcome));
        }

        AggregatedResult { outcomes }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct FixedAdapter {
        name: &'static str,
        outcome: DeliveryOutcome,
        calls: AtomicUsize,
    }

    impl FixedAdapter {
        fn new(name: &'static str, outcome: DeliveryOutcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChannelAdapter for FixedAdapter {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn deliver(&self, _message: &Message) -> DeliveryOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct PanickingAdapter;

    #[async_trait]
    impl ChannelAdapter for PanickingAdapter {
        fn name(&self) -> &'static str {
            "panicky"
        }

        async fn deliver(&self, _message: &Message) -> DeliveryOutcome {
            panic!("adapter blew up");
        }
    }

    struct SlowAdapter;

    #[async_trait]
    impl ChannelAdapter for SlowAdapter {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn deliver(&self, _message: &Message) -> DeliveryOutcome {
            tokio::time::sleep(Duration::from_millis(50)).await;
            DeliveryOutcome::Delivered
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
    async fn all_skipped_is_all_succeeded() {
        let coordinator = DeliveryCoordinator::new(vec![
            FixedAdapter::new("a", DeliveryOutcome::Skipped),
            FixedAdapter::new("b", DeliveryOutcome::Skipped),
        ]);
        let result = coordinator.dispatch(&test_message()).await;
        assert_eq!(result.overall(), Overall::AllSucceeded);
    }

    #[tokio::test]
    async fn one_failure_makes_partial_failure() {
        let coordinator = DeliveryCoordinator::new(vec![
            FixedAdapter::new("a", DeliveryOutcome::Delivered),
            FixedAdapter::new("b", DeliveryOutcome::Failed("boom".to_string())),
        ]);
        let result = coordinator.dispatch(&test_message()).await;
        assert_eq!(result.overall(), Overall::PartialFailure);
        assert_eq!(
            result.outcome("b"),
            Some(&DeliveryOutcome::Failed("boom".to_string()))
        );
    }

    #[tokio::test]
    async fn panicking_adapter_does_not_block_the_others() {
        let healthy = FixedAdapter::new("healthy", DeliveryOutcome::Delivered);
        let coordinator = DeliveryCoordinator::new(vec![
            Arc::new(PanickingAdapter) as Arc<dyn ChannelAdapter>,
            Arc::clone(&healthy) as Arc<dyn ChannelAdapter>,
        ]);

        let result = coordinator.dispatch(&test_message()).await;
        assert_eq!(
            result.outcome("panicky"),
            Some(&DeliveryOutcome::Failed("unknown error".to_string()))
        );
        assert_eq!(result.outcome("healthy"), Some(&DeliveryOutcome::Delivered));
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.overall(), Overall::PartialFailure);
    }

    #[tokio::test]
    async fn dispatch_waits_for_every_outcome() {
        let coordinator = DeliveryCoordinator::new(vec![
            Arc::new(SlowAdapter) as Arc<dyn ChannelAdapter>,
            FixedAdapter::new("fast", DeliveryOutcome::Delivered),
        ]);
        let result = coordinator.dispatch(&test_message()).await;
        // The barrier holds: the slow adapter's outcome is present.
        assert_eq!(result.outcome("slow"), Some(&DeliveryOutcome::Delivered));
        assert_eq!(result.outcomes().len(), 2);
    }

    #[tokio::test]
    async fn outcomes_keep_registration_order() {
        let coordinator = DeliveryCoordinator::new(vec![
            FixedAdapter::new("first", DeliveryOutcome::Skipped),
            FixedAdapter::new("second", DeliveryOutcome::Delivered),
        ]);
        let result = coordinator.dispatch(&test_message()).await;
        let names: Vec<_> = result.outcomes().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn every_adapter_sees_every_dispatch() {
        let a = FixedAdapter::new("a", DeliveryOutcome::Delivered);
        let b = FixedAdapter::new("b", DeliveryOutcome::Delivered);
        let coordinator = DeliveryCoordinator::new(vec![
            Arc::clone(&a) as Arc<dyn ChannelAdapter>,
            Arc::clone(&b) as Arc<dyn ChannelAdapter>,
        ]);

        // No deduplication: two dispatches mean two calls each.
        coordinator.dispatch(&test_message()).await;
        coordinator.dispatch(&test_message()).await;
        assert_eq!(a.calls.load(Ordering::SeqCst), 2);
        assert_eq!(b.calls.load(Ordering::SeqCst), 2);
    }
}
