//! Signal aggregation: connector outputs merged into one user context.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::traits::Connector;
use crate::types::{SignalMap, UserContext};

const DEFAULT_CONNECTOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds a [`UserContext`] from an ordered list of connectors.
///
/// On key collision the later connector wins.
#[derive(Clone)]
pub struct DataAggregator {
    connectors: Vec<Arc<dyn Connector>>,
    timeout: Duration,
}

impl DataAggregator {
    pub fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self {
            connectors,
            timeout: DEFAULT_CONNECTOR_TIMEOUT,
        }
    }

    /// Set the per-connector fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connectors(&self) -> &[Arc<dyn Connector>] {
        &self.connectors
    }

    /// Merge already-resolved sources in order. Later sources override
    /// earlier ones.
    pub fn merge<I>(user_id: impl Into<String>, sources: I) -> UserContext
    where
        I: IntoIterator<Item = SignalMap>,
    {
        let mut merged = SignalMap::new();
        for source in sources {
            merged.extend(source);
        }
        UserContext::new(user_id, merged)
    }

    /// Fetch every connector concurrently and merge the results.
    ///
    /// A connector that errors or exceeds the timeout contributes an empty
    /// map. Never fails.
    pub async fn collect(&self, user_id: &str) -> UserContext {
        let fetches = self.connectors.iter().map(|connector| async move {
            match tokio::time::timeout(self.timeout, connector.fetch(user_id)).await {
                Ok(Ok(signals)) => {
                    tracing::debug!(
                        connector = connector.name(),
                        signals = signals.len(),
                        "Connector fetched"
                    );
                    signals
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        connector = connector.name(),
                        user_id,
                        "Connector fetch failed, contributing no signals: {}",
                        e
                    );
                    SignalMap::new()
                }
                Err(_) => {
                    tracing::warn!(
                        connector = connector.name(),
                        user_id,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Connector fetch timed out, contributing no signals"
                    );
                    SignalMap::new()
                }
            }
        });

        // join_all preserves input order, so last-wins follows list order.
        let results = join_all(fetches).await;
        Self::merge(user_id, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ValtheraError, ValtheraResult};
    use crate::traits::StaticConnector;
    use crate::types::SignalValue;
    use async_trait::async_trait;

    struct FailingConnector;

    #[async_trait]
    impl Connector for FailingConnector {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(&self, _user_id: &str) -> ValtheraResult<SignalMap> {
            Err(ValtheraError::connector("failing", "upstream 503"))
        }
    }

    struct SlowConnector;

    #[async_trait]
    impl Connector for SlowConnector {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self, _user_id: &str) -> ValtheraResult<SignalMap> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(signals(&[("lead_score", 1.0)]))
        }
    }

    fn signals(pairs: &[(&str, f64)]) -> SignalMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), SignalValue::Number(*v)))
            .collect()
    }

    #[test]
    fn test_merge_last_wins() {
        let ctx = DataAggregator::merge(
            "user_1",
            vec![
                signals(&[("lead_score", 10.0), ("session_count", 1.0)]),
                signals(&[("lead_score", 80.0)]),
            ],
        );

        assert_eq!(ctx.user_id(), "user_1");
        assert_eq!(ctx.get("lead_score"), Some(&SignalValue::Number(80.0)));
        assert_eq!(ctx.get("session_count"), Some(&SignalValue::Number(1.0)));
    }

    #[test]
    fn test_merge_absent_key_stays_absent() {
        let ctx = DataAggregator::merge("user_1", vec![signals(&[("a", 1.0)])]);
        assert!(ctx.get("b").is_none());
        assert_eq!(ctx.len(), 1);
    }

    #[tokio::test]
    async fn test_collect_tolerates_failures() {
        let aggregator = DataAggregator::new(vec![
            Arc::new(StaticConnector::new("crm", signals(&[("lead_score", 80.0)]))) as Arc<dyn Connector>,
            Arc::new(FailingConnector),
            Arc::new(StaticConnector::new("analytics", signals(&[("session_count", 3.0)]))),
        ]);

        let ctx = aggregator.collect("user_1").await;
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("lead_score"), Some(&SignalValue::Number(80.0)));
    }

    #[tokio::test]
    async fn test_collect_order_is_list_order() {
        let aggregator = DataAggregator::new(vec![
            Arc::new(StaticConnector::new("first", signals(&[("lead_score", 10.0)]))) as Arc<dyn Connector>,
            Arc::new(StaticConnector::new("second", signals(&[("lead_score", 90.0)]))),
        ]);

        let ctx = aggregator.collect("user_1").await;
        assert_eq!(ctx.get("lead_score"), Some(&SignalValue::Number(90.0)));
    }

    #[tokio::test]
    async fn test_collect_times_out_slow_connector() {
        let aggregator = DataAggregator::new(vec![
            Arc::new(SlowConnector) as Arc<dyn Connector>,
            Arc::new(StaticConnector::new("fast", signals(&[("session_count", 2.0)]))),
        ])
        .with_timeout(Duration::from_millis(20));

        let ctx = aggregator.collect("user_1").await;
        assert!(ctx.get("lead_score").is_none());
        assert_eq!(ctx.get("session_count"), Some(&SignalValue::Number(2.0)));
    }
}
