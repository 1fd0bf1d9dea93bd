// Telemetry polling engine
// Sequential poll-query-append-emit-sleep loop over a metrics backend

use crate::config::{ConfigError, MIN_RECOMMENDED_INTERVAL_SECS, MAX_RECOMMENDED_INTERVAL_SECS};
use crate::history::PollEvent;
use crate::metrics::query::{
    latest_datapoint, Dimension, MetricsQuery, QueryError, Statistic, StatisticsRequest,
};
use crate::metrics::{MetricCatalog, Sample};
use crate::render::TelemetrySink;
use crate::session::MonitorSession;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, instrument, warn};

/// Runtime parameters for one monitoring session
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Instance to monitor
    pub resource_id: String,

    /// Region/endpoint selector passed through to the backend
    pub region: String,

    /// Fixed delay between the end of one tick and the start of the next
    pub refresh_interval: Duration,

    /// Trailing window each query searches for datapoints
    pub lookback_secs: u64,

    /// Requested datapoint granularity
    pub period_secs: u64,

    /// Ring buffer capacity per metric group
    pub retention_events: usize,

    /// Metric groups to poll each tick
    pub catalog: MetricCatalog,
}

impl PollerConfig {
    pub fn new(resource_id: &str, region: &str, refresh_interval: Duration) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            region: region.to_string(),
            refresh_interval,
            lookback_secs: 300,
            period_secs: 300,
            retention_events: 720,
            catalog: MetricCatalog::standard(),
        }
    }

    /// Check startup preconditions; the loop never starts on failure
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resource_id.trim().is_empty() {
            return Err(ConfigError::EmptyResourceId);
        }

        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroRefreshInterval);
        }

        if self.lookback_secs == 0 {
            return Err(ConfigError::ZeroLookback);
        }

        if self.retention_events == 0 {
            return Err(ConfigError::ZeroRetention);
        }

        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        for group in self.catalog.groups() {
            if group.metrics.is_empty() {
                return Err(ConfigError::EmptyGroup(group.name.clone()));
            }
        }

        let secs = self.refresh_interval.as_secs();
        if secs < MIN_RECOMMENDED_INTERVAL_SECS || secs > MAX_RECOMMENDED_INTERVAL_SECS {
            warn!(
                refresh_interval_secs = secs,
                "Refresh interval outside the recommended {}-{}s range",
                MIN_RECOMMENDED_INTERVAL_SECS,
                MAX_RECOMMENDED_INTERVAL_SECS
            );
        }

        Ok(())
    }
}

/// A single metric's query failed during a tick
/// Non-fatal: the tick continues with the remaining metrics
#[derive(Debug)]
pub struct MetricFailure {
    pub group: String,
    pub metric: String,
    pub error: QueryError,
}

/// Why the polling loop exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// External cancellation, the only graceful exit
    Cancelled,
}

/// Polls all configured metrics for one resource on a fixed interval
///
/// Each tick queries every metric sequentially, keeps the latest
/// datapoint per metric, appends a poll event to the group's history
/// in the session, and emits the updated snapshot to the sink. No
/// error after startup ever terminates the loop; only cancellation
/// does.
pub struct TelemetryPoller<Q: MetricsQuery> {
    config: PollerConfig,
    query: Arc<Q>,
    session: Arc<MonitorSession>,
    ticks: AtomicU64,
}

impl<Q: MetricsQuery> TelemetryPoller<Q> {
    /// Validate the configuration and create the poller together with
    /// the session that will own the accumulated histories
    pub fn new(config: PollerConfig, query: Arc<Q>) -> Result<Self, ConfigError> {
        config.validate()?;

        let session = Arc::new(MonitorSession::new(
            &config.resource_id,
            &config.region,
            config.retention_events,
        ));

        info!(
            session_id = %session.id(),
            resource_id = %config.resource_id,
            region = %config.region,
            groups = config.catalog.groups().len(),
            metrics = config.catalog.metric_count(),
            "Monitoring session created"
        );

        Ok(Self {
            config,
            query,
            session,
            ticks: AtomicU64::new(0),
        })
    }

    /// Handle to the session for concurrent snapshot readers
    pub fn session(&self) -> Arc<MonitorSession> {
        self.session.clone()
    }

    pub fn ticks_completed(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Run one poll cycle: query every metric in every group, append
    /// per-group poll events, emit updated snapshots and diagnostics
    #[instrument(skip(self, sink), fields(resource_id = %self.config.resource_id))]
    pub async fn tick(&self, sink: &dyn TelemetrySink) {
        for group in self.config.catalog.groups() {
            let mut samples = Vec::with_capacity(group.metrics.len());
            let mut failures = Vec::new();

            let end_time = Utc::now();
            let start_time = end_time - chrono::Duration::seconds(self.config.lookback_secs as i64);

            for spec in &group.metrics {
                let request = StatisticsRequest {
                    namespace: spec.namespace.clone(),
                    metric_name: spec.name.clone(),
                    dimension: Dimension::instance(&self.config.resource_id),
                    start_time,
                    end_time,
                    period_secs: self.config.period_secs,
                    statistic: Statistic::Average,
                    unit: spec.unit.clone(),
                };

                match self.query.get_statistics(&request).await {
                    Ok(points) => match latest_datapoint(points) {
                        Some(point) => samples.push(Sample {
                            metric: spec.name.clone(),
                            timestamp: point.timestamp,
                            average: point.value,
                            unit: spec.unit.clone(),
                        }),
                        None => info!(
                            metric = %spec.name,
                            lookback_secs = self.config.lookback_secs,
                            "No datapoints in lookback window"
                        ),
                    },
                    Err(error) => {
                        warn!(
                            group = %group.name,
                            metric = %spec.name,
                            error = %error,
                            "Metric query failed, continuing with remaining metrics"
                        );
                        failures.push(MetricFailure {
                            group: group.name.clone(),
                            metric: spec.name.clone(),
                            error,
                        });
                    }
                }
            }

            // The event is recorded even when every metric came back
            // empty or failed, so the history reflects every tick
            let event = PollEvent {
                at: Utc::now(),
                samples,
            };

            match self.session.record(&group.name, event) {
                Some(snapshot) => sink.on_update(&group.name, &snapshot),
                None => warn!(group = %group.name, "Out-of-order poll event dropped"),
            }

            for failure in &failures {
                sink.on_failure(failure);
            }
        }

        let completed = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(tick = completed, "Poll cycle complete");
    }

    /// Run the polling loop until cancelled
    ///
    /// Cancellation is honored at the top of each tick and during the
    /// end-of-tick sleep. An in-flight query is never aborted; it
    /// completes or fails normally before the loop notices the signal.
    pub async fn run(
        &self,
        sink: &dyn TelemetrySink,
        mut shutdown: broadcast::Receiver<()>,
    ) -> StopReason {
        info!(
            refresh_interval_secs = self.config.refresh_interval.as_secs(),
            "Starting telemetry polling loop"
        );

        loop {
            // Anything other than "no signal yet" means stop
            if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
                info!("Cancellation received, stopping before next tick");
                return StopReason::Cancelled;
            }

            self.tick(sink).await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.refresh_interval) => {}
                _ = shutdown.recv() => {
                    info!(
                        ticks = self.ticks_completed(),
                        "Cancellation received during sleep, stopping"
                    );
                    return StopReason::Cancelled;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricGroup, MetricSpec};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Counts queries and always returns one datapoint
    struct CountingQuery {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricsQuery for CountingQuery {
        async fn get_statistics(
            &self,
            request: &StatisticsRequest,
        ) -> Result<Vec<crate::metrics::query::Datapoint>, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![crate::metrics::query::Datapoint {
                timestamp: request.end_time,
                value: 1.0,
            }])
        }
    }

    /// Records every emission for assertions
    #[derive(Default)]
    struct RecordingSink {
        updates: Mutex<Vec<(String, usize)>>,
        failures: Mutex<Vec<String>>,
    }

    impl TelemetrySink for RecordingSink {
        fn on_update(&self, group: &str, events: &crate::history::HistorySnapshot) {
            self.updates.lock().push((group.to_string(), events.len()));
        }

        fn on_failure(&self, failure: &MetricFailure) {
            self.failures.lock().push(failure.metric.clone());
        }
    }

    fn single_metric_config() -> PollerConfig {
        let mut config = PollerConfig::new("i-0fde582b868f11d61", "eu-north-1", Duration::from_secs(10));
        config.catalog = MetricCatalog::new(vec![MetricGroup {
            name: "CPU".to_string(),
            metrics: vec![MetricSpec::new("AWS/EC2", "CPUUtilization", "Percent")],
        }]);
        config
    }

    #[test]
    fn test_empty_resource_id_rejected() {
        let config = PollerConfig::new("", "eu-north-1", Duration::from_secs(30));
        let query = Arc::new(CountingQuery { calls: AtomicUsize::new(0) });
        let err = TelemetryPoller::new(config, query.clone()).err().unwrap();
        assert_eq!(err, ConfigError::EmptyResourceId);
        // Rejected before any query was made
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PollerConfig::new("i-0123", "eu-north-1", Duration::ZERO);
        let query = Arc::new(CountingQuery { calls: AtomicUsize::new(0) });
        let err = TelemetryPoller::new(config, query.clone()).err().unwrap();
        assert_eq!(err, ConfigError::ZeroRefreshInterval);
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let mut config = PollerConfig::new("i-0123", "eu-north-1", Duration::from_secs(30));
        config.catalog = MetricCatalog::new(Vec::new());
        let query = Arc::new(CountingQuery { calls: AtomicUsize::new(0) });
        let err = TelemetryPoller::new(config, query.clone()).err().unwrap();
        assert_eq!(err, ConfigError::EmptyCatalog);
        assert_eq!(query.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tick_queries_every_metric_once() {
        let config = PollerConfig::new("i-0123", "eu-north-1", Duration::from_secs(30));
        let metric_count = config.catalog.metric_count();
        let query = Arc::new(CountingQuery { calls: AtomicUsize::new(0) });
        let poller = TelemetryPoller::new(config, query.clone()).unwrap();
        let sink = RecordingSink::default();

        poller.tick(&sink).await;

        assert_eq!(query.calls.load(Ordering::SeqCst), metric_count);
        assert_eq!(poller.ticks_completed(), 1);
        // One emission per group
        assert_eq!(sink.updates.lock().len(), 5);
    }

    #[tokio::test]
    async fn test_history_grows_across_ticks() {
        let query = Arc::new(CountingQuery { calls: AtomicUsize::new(0) });
        let poller = TelemetryPoller::new(single_metric_config(), query).unwrap();
        let sink = RecordingSink::default();

        poller.tick(&sink).await;
        poller.tick(&sink).await;

        let snapshot = poller.session().snapshot("CPU").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot[0].at < snapshot[1].at);
        assert!(sink.failures.lock().is_empty());
    }
}
