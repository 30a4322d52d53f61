//! Heartbeat sampler: a monotonically increasing counter event,
//! the simplest possible `Sampler` implementation, useful as a liveness
//! signal for the downstream publisher independent of any real metric.

use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::SamplerResult;
use crate::event::{now_ms, Event, EventBatch, EventBody, EventKind, HeartbeatSample};
use crate::sampler::Sampler;

pub struct HeartbeatSampler {
    interval: Duration,
    counter: u64,
}

impl HeartbeatSampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            counter: 0,
        }
    }
}

impl Sampler for HeartbeatSampler {
    fn name(&self) -> &'static str {
        "heartbeat"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self) -> BoxFuture<'_, SamplerResult<EventBatch>> {
        self.counter += 1;
        let result = Ok(vec![Event {
            kind: EventKind::HeartbeatSample,
            entity_key: "host".to_string(),
            timestamp_ms: now_ms(),
            body: EventBody::Heartbeat(HeartbeatSample {
                counter: self.counter,
            }),
        }]);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counter_increases_monotonically_across_samples() {
        let mut sampler = HeartbeatSampler::new(Duration::from_secs(30));
        let first = sampler.sample().await.unwrap();
        let second = sampler.sample().await.unwrap();
        let third = sampler.sample().await.unwrap();

        let counter_of = |batch: &EventBatch| match &batch[0].body {
            EventBody::Heartbeat(h) => h.counter,
            _ => panic!("expected heartbeat body"),
        };
        assert_eq!(counter_of(&first), 1);
        assert_eq!(counter_of(&second), 2);
        assert_eq!(counter_of(&third), 3);
    }

    #[test]
    fn zero_interval_is_disabled() {
        let sampler = HeartbeatSampler::new(Duration::ZERO);
        assert!(sampler.disabled());
    }

    #[test]
    fn nonzero_interval_is_enabled() {
        let sampler = HeartbeatSampler::new(Duration::from_secs(1));
        assert!(!sampler.disabled());
    }
}
