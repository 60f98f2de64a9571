//! Decision engine coordination logic.
//!
//! The engine combines whitelist bypass, the rolling rate counter and the
//! ban tracker into one verdict per event.

use crate::application::ban_tracker::BanTracker;
use crate::application::config::RateLimitConfig;
use crate::application::metrics::Metrics;
use crate::application::ports::{BanObserver, KeyValueStore, StoreError};
use crate::application::rate_counter::RateCounter;
use crate::domain::{
    message::InputMessage,
    verdict::{Verdict, RATE_LIMITED_MSG},
};
use crate::infrastructure::observer::TracingBanObserver;
use std::sync::Arc;

/// Decides what the relay does with each event.
///
/// Cloning is cheap: clones share the store handle, configuration, observer
/// and metrics.
#[derive(Debug, Clone)]
pub struct DecisionEngine<S> {
    counter: RateCounter<S>,
    bans: BanTracker<S>,
    config: Arc<RateLimitConfig>,
    observer: Arc<dyn BanObserver>,
    metrics: Metrics,
}

impl<S> DecisionEngine<S>
where
    S: KeyValueStore + Clone,
{
    /// Create an engine over a store with a validated configuration.
    ///
    /// Banned hits are logged through [`TracingBanObserver`] unless another
    /// observer is set with [`with_observer`](Self::with_observer).
    pub fn new(store: S, config: RateLimitConfig) -> Self {
        Self {
            counter: RateCounter::new(store.clone()),
            bans: BanTracker::new(store),
            config: Arc::new(config),
            observer: Arc::new(TracingBanObserver),
            metrics: Metrics::new(),
        }
    }

    /// Replace the observer notified on shadow-rejects.
    pub fn with_observer(mut self, observer: Arc<dyn BanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Decide whether to accept, reject or shadow-reject an event.
    ///
    /// 1. Address sources that are not whitelisted are counted. A breach arms
    ///    the ban (when enabled) and rejects.
    /// 2. Every other event, whitelisted or not and of any source kind, is
    ///    checked against the ban record for its source value.
    /// 3. Anything left is accepted.
    ///
    /// # Errors
    /// Returns the store error if any store call fails. Nothing is retried.
    pub async fn decide(&self, message: &InputMessage) -> Result<Verdict, StoreError> {
        let verdict = self.evaluate(message).await?;
        self.metrics.record(verdict.action);

        tracing::debug!(
            id = %verdict.id,
            source = %message.source_info,
            source_kind = %message.source_type,
            action = ?verdict.action,
            "event decided"
        );

        Ok(verdict)
    }

    async fn evaluate(&self, message: &InputMessage) -> Result<Verdict, StoreError> {
        let id = &message.event.id;
        let key = message.source_info.as_str();

        if message.source_type.is_address() && !self.config.is_whitelisted(key) {
            let outcome = self
                .counter
                .check_and_increment(key, self.config.max(), self.config.interval())
                .await?;

            if outcome.over_limit {
                if self.config.bans_enabled() {
                    self.bans.ban(key, self.config.ban_interval()).await?;
                }
                return Ok(Verdict::reject(id.as_str(), RATE_LIMITED_MSG));
            }
        }

        if self.config.bans_enabled() && self.bans.is_banned(key).await? {
            self.observer
                .on_shadow_reject(&message.source(), &message.event);
            return Ok(Verdict::shadow_reject(id.as_str()));
        }

        Ok(Verdict::accept(id.as_str()))
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get a reference to the rate counter.
    pub fn counter(&self) -> &RateCounter<S> {
        &self.counter
    }

    /// Get a reference to the ban tracker.
    pub fn bans(&self) -> &BanTracker<S> {
        &self.bans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::Event;
    use crate::domain::verdict::Action;
    use crate::infrastructure::memory_store::InMemoryStore;
    use crate::infrastructure::mocks::{FailingStore, MockClock, RecordingObserver};
    use std::time::{Duration, Instant};

    fn event(id: &str) -> Event {
        Event::new(id, "79be667e", 1)
    }

    fn ip4(value: &str) -> InputMessage {
        InputMessage::new(event("e1"), "IP4", value)
    }

    fn engine(config: RateLimitConfig) -> (DecisionEngine<InMemoryStore>, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let store = InMemoryStore::with_clock(clock.clone());
        (DecisionEngine::new(store, config), clock)
    }

    fn config(max: u64, interval_ms: u64, ban_ms: u64) -> RateLimitConfig {
        RateLimitConfig::builder()
            .with_max(max)
            .with_interval(Duration::from_millis(interval_ms))
            .with_ban_interval(Duration::from_millis(ban_ms))
            .build()
            .unwrap()
    }

    async fn actions(
        engine: &DecisionEngine<InMemoryStore>,
        msg: &InputMessage,
        n: usize,
    ) -> Vec<Action> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(engine.decide(msg).await.unwrap().action);
        }
        out
    }

    use Action::{Accept, Reject, ShadowReject};

    #[tokio::test]
    async fn test_rate_limit_scenario() {
        let (engine, clock) = engine(config(4, 50, 0));
        let msg = ip4("1.1.1.1");

        assert_eq!(actions(&engine, &msg, 4).await, vec![Accept; 4]);
        assert_eq!(actions(&engine, &msg, 3).await, vec![Reject; 3]);

        clock.advance(Duration::from_millis(50));
        assert_eq!(actions(&engine, &msg, 2).await, vec![Accept; 2]);
    }

    #[tokio::test]
    async fn test_shadow_ban_scenario() {
        let (engine, clock) = engine(config(4, 50, 100));
        let msg = ip4("1.1.1.1");

        assert_eq!(actions(&engine, &msg, 4).await, vec![Accept; 4]);
        assert_eq!(actions(&engine, &msg, 3).await, vec![Reject; 3]);

        // Rate window drained, ban still active
        clock.advance(Duration::from_millis(50));
        assert_eq!(actions(&engine, &msg, 2).await, vec![ShadowReject; 2]);

        // Both drained
        clock.advance(Duration::from_millis(50));
        assert_eq!(actions(&engine, &msg, 2).await, vec![Accept; 2]);

        // Window still holds the two accepts above
        assert_eq!(
            actions(&engine, &msg, 3).await,
            vec![Accept, Accept, Reject]
        );

        clock.advance(Duration::from_millis(50));
        assert_eq!(actions(&engine, &msg, 1).await, vec![ShadowReject]);

        clock.advance(Duration::from_millis(50));
        assert_eq!(actions(&engine, &msg, 1).await, vec![Accept]);
    }

    #[tokio::test]
    async fn test_reject_message_and_id() {
        let (engine, _clock) = engine(config(0, 50, 0));
        let verdict = engine.decide(&ip4("1.1.1.1")).await.unwrap();

        assert_eq!(verdict, Verdict::reject("e1", RATE_LIMITED_MSG));
    }

    #[tokio::test]
    async fn test_no_ban_when_disabled() {
        let (engine, clock) = engine(config(1, 50, 0));
        let msg = ip4("1.1.1.1");

        assert_eq!(actions(&engine, &msg, 2).await, vec![Accept, Reject]);
        assert!(!engine.bans().is_banned("1.1.1.1").await.unwrap());

        clock.advance(Duration::from_millis(50));
        assert_eq!(actions(&engine, &msg, 1).await, vec![Accept]);
    }

    #[tokio::test]
    async fn test_whitelisted_source_never_counted() {
        let config = RateLimitConfig::builder()
            .with_max(1)
            .with_whitelist(["127.0.0.1"])
            .build()
            .unwrap();
        let (engine, _clock) = engine(config);
        let msg = ip4("127.0.0.1");

        assert_eq!(actions(&engine, &msg, 20).await, vec![Accept; 20]);
        assert_eq!(engine.counter().count("127.0.0.1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_whitelisted_source_still_shadow_banned() {
        let config = RateLimitConfig::builder()
            .with_max(1)
            .with_ban_interval(Duration::from_secs(10))
            .with_whitelist(["127.0.0.1"])
            .build()
            .unwrap();
        let (engine, _clock) = engine(config);

        engine
            .bans()
            .ban("127.0.0.1", Duration::from_secs(10))
            .await
            .unwrap();

        let verdict = engine.decide(&ip4("127.0.0.1")).await.unwrap();
        assert_eq!(verdict.action, ShadowReject);
    }

    #[tokio::test]
    async fn test_non_address_sources_not_counted() {
        let (engine, _clock) = engine(config(1, 50, 0));
        let msg = InputMessage::new(event("e1"), "Stream", "wss://relay.example");

        assert_eq!(actions(&engine, &msg, 5).await, vec![Accept; 5]);
        assert_eq!(engine.counter().count("wss://relay.example").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ban_key_collides_across_source_kinds() {
        // Ban records are keyed by raw value only, so a non-address source
        // with the same literal value inherits the address's ban.
        let (engine, _clock) = engine(config(1, 50, 1000));

        assert_eq!(actions(&engine, &ip4("1.1.1.1"), 2).await, vec![Accept, Reject]);

        let other = InputMessage::new(event("e2"), "Import", "1.1.1.1");
        assert_eq!(engine.decide(&other).await.unwrap().action, ShadowReject);

        let ip6 = InputMessage::new(event("e3"), "IP6", "1.1.1.1");
        assert_eq!(engine.decide(&ip6).await.unwrap().action, Reject);
    }

    #[tokio::test]
    async fn test_unknown_source_kind_falls_through() {
        let (engine, _clock) = engine(config(0, 50, 100));
        let msg = InputMessage::new(event("e1"), "Carrier-Pigeon", "coop-7");

        assert_eq!(engine.decide(&msg).await.unwrap().action, Accept);
    }

    #[tokio::test]
    async fn test_observer_sees_banned_hits() {
        let observer = Arc::new(RecordingObserver::new());
        let (engine, _clock) = engine(config(1, 50, 1000));
        let engine = engine.with_observer(observer.clone());
        let msg = ip4("1.1.1.1");

        assert_eq!(actions(&engine, &msg, 2).await, vec![Accept, Reject]);
        assert_eq!(observer.count(), 0);

        // Counting the next request still rejects: window not drained
        assert_eq!(actions(&engine, &msg, 1).await, vec![Reject]);

        let import = InputMessage::new(event("e9"), "Import", "1.1.1.1");
        engine.decide(&import).await.unwrap();

        let hits = observer.hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source.value, "1.1.1.1");
        assert_eq!(hits[0].event_id, "e9");
        assert_eq!(hits[0].kind, 1);
    }

    #[tokio::test]
    async fn test_metrics_track_actions() {
        let (engine, clock) = engine(config(1, 50, 100));
        let msg = ip4("1.1.1.1");

        actions(&engine, &msg, 2).await;
        clock.advance(Duration::from_millis(50));
        actions(&engine, &msg, 1).await;

        let snapshot = engine.metrics().snapshot();
        assert_eq!(snapshot.accepted, 1);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.shadow_rejected, 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let engine = DecisionEngine::new(FailingStore::new("connection refused"), config(4, 50, 0));

        let result = engine.decide(&ip4("1.1.1.1")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(engine.metrics().snapshot().total(), 0);
    }

    #[tokio::test]
    async fn test_store_not_touched_for_whitelisted_without_bans() {
        let config = RateLimitConfig::builder()
            .with_whitelist(["10.0.0.1"])
            .build()
            .unwrap();
        let store = FailingStore::new("down");
        let engine = DecisionEngine::new(store.clone(), config);

        let verdict = engine.decide(&ip4("10.0.0.1")).await.unwrap();
        assert_eq!(verdict.action, Accept);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decisions_count_every_request() {
        let (engine, _clock) = engine(config(100, 60_000, 0));
        let mut handles = vec![];

        for _ in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let msg = ip4("9.9.9.9");
                let mut rejected = 0;
                for _ in 0..25 {
                    if engine.decide(&msg).await.unwrap().action == Reject {
                        rejected += 1;
                    }
                }
                rejected
            }));
        }

        let mut rejected = 0;
        for handle in handles {
            rejected += handle.await.unwrap();
        }

        assert_eq!(engine.counter().count("9.9.9.9").await.unwrap(), 200);
        assert_eq!(rejected, 100);
    }
}
