// Metric catalog types
// MetricSpecs are fixed configuration data, grouped for presentation

pub mod query;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one queryable metric: namespace, name, and unit of measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub namespace: String,
    pub name: String,
    pub unit: String,
}

impl MetricSpec {
    pub fn new(namespace: &str, name: &str, unit: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }
}

/// A named set of metrics presented together (e.g., all disk metrics)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricGroup {
    pub name: String,
    pub metrics: Vec<MetricSpec>,
}

/// One observation: the most recent average for a metric within the
/// lookback window of a single poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub metric: String,
    pub timestamp: DateTime<Utc>,
    pub average: f64,
    pub unit: String,
}

/// The static catalog of metric groups a monitoring session polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCatalog {
    groups: Vec<MetricGroup>,
}

impl MetricCatalog {
    pub fn new(groups: Vec<MetricGroup>) -> Self {
        Self { groups }
    }

    /// The standard instance catalog: hypervisor metrics plus the
    /// in-guest agent metrics that require the agent to be installed
    pub fn standard() -> Self {
        Self::new(vec![
            MetricGroup {
                name: "CPU".to_string(),
                metrics: vec![MetricSpec::new("AWS/EC2", "CPUUtilization", "Percent")],
            },
            MetricGroup {
                name: "Disk Operations".to_string(),
                metrics: vec![
                    MetricSpec::new("AWS/EC2", "DiskReadOps", "Count"),
                    MetricSpec::new("AWS/EC2", "DiskWriteOps", "Count"),
                    MetricSpec::new("AWS/EC2", "DiskReadBytes", "Bytes"),
                    MetricSpec::new("AWS/EC2", "DiskWriteBytes", "Bytes"),
                ],
            },
            MetricGroup {
                name: "Network".to_string(),
                metrics: vec![
                    MetricSpec::new("AWS/EC2", "NetworkIn", "Bytes"),
                    MetricSpec::new("AWS/EC2", "NetworkOut", "Bytes"),
                ],
            },
            MetricGroup {
                name: "Status Checks".to_string(),
                metrics: vec![
                    MetricSpec::new("AWS/EC2", "StatusCheckFailed", "Count"),
                    MetricSpec::new("AWS/EC2", "StatusCheckFailed_Instance", "Count"),
                    MetricSpec::new("AWS/EC2", "StatusCheckFailed_System", "Count"),
                ],
            },
            MetricGroup {
                name: "Agent".to_string(),
                metrics: vec![
                    MetricSpec::new("CWAgent", "MemoryUtilization", "Percent"),
                    MetricSpec::new("CWAgent", "SwapUsage", "Bytes"),
                    MetricSpec::new("CWAgent", "FreeStorageSpace", "Bytes"),
                ],
            },
        ])
    }

    pub fn groups(&self) -> &[MetricGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of metrics across all groups (one query each per tick)
    pub fn metric_count(&self) -> usize {
        self.groups.iter().map(|g| g.metrics.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog() {
        let catalog = MetricCatalog::standard();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.groups().len(), 5);
        assert_eq!(catalog.metric_count(), 13);
    }

    #[test]
    fn test_standard_catalog_group_names() {
        let catalog = MetricCatalog::standard();
        let names: Vec<&str> = catalog.groups().iter().map(|g| g.name.as_str()).collect();
        assert!(names.contains(&"CPU"));
        assert!(names.contains(&"Network"));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = MetricCatalog::new(Vec::new());
        assert!(catalog.is_empty());
        assert_eq!(catalog.metric_count(), 0);
    }
}
