// Metrics query collaborator interface
// The external statistics backend the poller fans out to each tick

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Statistic requested from the metrics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Minimum,
    Maximum,
    Sum,
    SampleCount,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
            Statistic::Sum => "Sum",
            Statistic::SampleCount => "SampleCount",
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dimension scoping a query to one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    /// Scope a query to a single instance
    pub fn instance(instance_id: &str) -> Self {
        Self {
            name: "InstanceId".to_string(),
            value: instance_id.to_string(),
        }
    }
}

/// One datapoint returned by the metrics backend
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A single bounded-lookback statistics query
#[derive(Debug, Clone)]
pub struct StatisticsRequest {
    pub namespace: String,
    pub metric_name: String,
    pub dimension: Dimension,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub period_secs: u64,
    pub statistic: Statistic,
    pub unit: String,
}

/// Failure modes surfaced by the metrics backend
/// All of these are non-fatal to a monitoring session
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("request throttled: {0}")]
    Throttled(String),

    #[error("unknown metric {namespace}/{metric}")]
    UnknownMetric { namespace: String, metric: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("query timed out after {0} seconds")]
    Timeout(u64),
}

/// External metrics backend the poller queries once per metric per tick
#[async_trait]
pub trait MetricsQuery: Send + Sync {
    async fn get_statistics(
        &self,
        request: &StatisticsRequest,
    ) -> Result<Vec<Datapoint>, QueryError>;
}

/// Latest-wins tie-break: when a query returns multiple datapoints in
/// the lookback window, keep the one with the maximum timestamp
pub fn latest_datapoint(mut points: Vec<Datapoint>) -> Option<Datapoint> {
    points.sort_by_key(|p| p.timestamp);
    points.pop()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_latest_datapoint_empty() {
        assert_eq!(latest_datapoint(Vec::new()), None);
    }

    #[test]
    fn test_latest_datapoint_single() {
        let points = vec![Datapoint { timestamp: at(0), value: 42.0 }];
        let latest = latest_datapoint(points).unwrap();
        assert_eq!(latest.value, 42.0);
    }

    #[test]
    fn test_latest_datapoint_picks_max_timestamp() {
        // Backfill can return more than one point even for a
        // period-sized window; the newest one wins
        let points = vec![
            Datapoint { timestamp: at(300), value: 55.0 },
            Datapoint { timestamp: at(0), value: 10.0 },
            Datapoint { timestamp: at(150), value: 30.0 },
        ];
        let latest = latest_datapoint(points).unwrap();
        assert_eq!(latest.timestamp, at(300));
        assert_eq!(latest.value, 55.0);
    }

    #[test]
    fn test_instance_dimension() {
        let dim = Dimension::instance("i-0123456789abcdef0");
        assert_eq!(dim.name, "InstanceId");
        assert_eq!(dim.value, "i-0123456789abcdef0");
    }
}
