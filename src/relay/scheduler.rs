//! Delivery pacing: a randomized pause before every reply goes out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::info;

use crate::relay::provider::GeneratedReply;
use crate::relay::random::RandomSource;

/// Platform send interface.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    /// Send text to a chat; returns the platform message id.
    async fn send(&self, chat_id: i64, text: &str) -> Result<i64, String>;
}

/// Waits a human-looking moment, then issues exactly one send.
pub struct DeliveryScheduler {
    min_delay: Duration,
    max_delay: Duration,
    rng: Arc<dyn RandomSource>,
}

impl DeliveryScheduler {
    pub fn new(min_delay: Duration, max_delay: Duration, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            min_delay,
            max_delay,
            rng,
        }
    }

    /// Uniform draw in [min_delay, max_delay).
    pub fn pick_delay(&self) -> Duration {
        let span = self.max_delay.saturating_sub(self.min_delay);
        self.min_delay + span.mul_f64(self.rng.next_f64())
    }

    /// Sleep, then send. One attempt; a send failure is the caller's
    /// terminal error for this message.
    pub async fn deliver(
        &self,
        sink: &dyn OutboundSink,
        chat_id: i64,
        reply: &GeneratedReply,
    ) -> Result<i64, String> {
        let delay = self.pick_delay();
        info!("Waiting for {:.2} seconds before responding", delay.as_secs_f64());
        sleep(delay).await;

        let preview: String = reply.text.chars().take(50).collect();
        info!("Sending response: {preview}...");
        sink.send(chat_id, &reply.text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    use crate::relay::provider::ReplySource;
    use crate::relay::random::{SequenceSource, ThreadRngSource};

    struct RecordingSink {
        sent: Mutex<Vec<(i64, String)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn sent(&self) -> Vec<(i64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutboundSink for RecordingSink {
        async fn send(&self, chat_id: i64, text: &str) -> Result<i64, String> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            if self.fail {
                Err("network unreachable".to_string())
            } else {
                Ok(1)
            }
        }
    }

    fn reply(text: &str) -> GeneratedReply {
        GeneratedReply {
            text: text.to_string(),
            source: ReplySource::Primary,
        }
    }

    #[test]
    fn test_delays_fall_within_configured_bounds() {
        let scheduler = DeliveryScheduler::new(
            Duration::from_millis(500),
            Duration::from_millis(2000),
            Arc::new(ThreadRngSource),
        );

        for _ in 0..1000 {
            let delay = scheduler.pick_delay();
            assert!(delay >= Duration::from_millis(500), "too short: {delay:?}");
            assert!(delay < Duration::from_millis(2000), "too long: {delay:?}");
        }
    }

    #[test]
    fn test_delay_endpoints() {
        let scheduler = DeliveryScheduler::new(
            Duration::from_millis(500),
            Duration::from_millis(2000),
            Arc::new(SequenceSource::new(&[0.0, 0.999])),
        );

        assert_eq!(scheduler.pick_delay(), Duration::from_millis(500));
        assert!(scheduler.pick_delay() < Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_deliver_waits_at_least_min_delay() {
        let scheduler = DeliveryScheduler::new(
            Duration::from_millis(20),
            Duration::from_millis(40),
            Arc::new(SequenceSource::new(&[0.0])),
        );
        let sink = RecordingSink::new(false);

        let started = Instant::now();
        scheduler
            .deliver(sink.as_ref(), 42, &reply("hi there"))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(sink.sent(), vec![(42, "hi there".to_string())]);
    }

    #[tokio::test]
    async fn test_send_failure_propagates_without_retry() {
        let scheduler = DeliveryScheduler::new(
            Duration::from_millis(1),
            Duration::from_millis(2),
            Arc::new(SequenceSource::new(&[0.0])),
        );
        let sink = RecordingSink::new(true);

        let result = scheduler.deliver(sink.as_ref(), 42, &reply("hi")).await;

        assert!(result.is_err());
        assert_eq!(sink.sent().len(), 1);
    }
}
