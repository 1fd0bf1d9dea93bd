// Configuration Management Module
// Handles skywatch.toml loading, defaults, and validation

use crate::metrics::{MetricCatalog, MetricGroup, MetricSpec};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Recommended refresh interval bounds (matches the console slider)
pub const MIN_RECOMMENDED_INTERVAL_SECS: u64 = 10;
pub const MAX_RECOMMENDED_INTERVAL_SECS: u64 = 120;

/// Invalid or missing startup parameters
/// Fatal: reported once, the polling loop never starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("resource id must not be empty")]
    EmptyResourceId,

    #[error("refresh interval must be a positive number of seconds")]
    ZeroRefreshInterval,

    #[error("lookback window must be a positive number of seconds")]
    ZeroLookback,

    #[error("metric catalog must contain at least one group")]
    EmptyCatalog,

    #[error("metric group '{0}' has no metrics")]
    EmptyGroup(String),

    #[error("retention must keep at least one poll event")]
    ZeroRetention,
}

/// Main Skywatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkywatchConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Optional catalog override; when absent the standard instance
    /// catalog is used
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,

    #[serde(default = "default_period")]
    pub period_secs: u64,

    #[serde(default = "default_retention")]
    pub retention_events: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,

    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

// Default value functions
fn default_region() -> String { "eu-north-1".to_string() }
fn default_refresh_interval() -> u64 { 30 }
fn default_lookback() -> u64 { 300 }
fn default_period() -> u64 { 300 }
fn default_retention() -> usize { 720 }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            refresh_interval_secs: default_refresh_interval(),
            lookback_secs: default_lookback(),
            period_secs: default_period(),
            retention_events: default_retention(),
        }
    }
}

impl Default for SkywatchConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            groups: Vec::new(),
        }
    }
}

impl SkywatchConfig {
    /// Load configuration from file or use defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let contents = std::fs::read_to_string(path)
                .context("Failed to read configuration file")?;

            let config: SkywatchConfig = toml::from_str(&contents)
                .context("Failed to parse configuration file")?;

            config.validate()?;
            Ok(config)
        } else {
            warn!("Configuration file not found, using defaults");
            info!("Create skywatch.toml to customize the metric catalog");
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }

        if self.monitor.lookback_secs == 0 {
            return Err(ConfigError::ZeroLookback);
        }

        if self.monitor.retention_events == 0 {
            return Err(ConfigError::ZeroRetention);
        }

        for group in &self.groups {
            if group.metrics.is_empty() {
                return Err(ConfigError::EmptyGroup(group.name.clone()));
            }
        }

        // Intervals outside the recommended band still work, just
        // noisier or slower than the console is tuned for
        if self.monitor.refresh_interval_secs < MIN_RECOMMENDED_INTERVAL_SECS
            || self.monitor.refresh_interval_secs > MAX_RECOMMENDED_INTERVAL_SECS
        {
            warn!(
                refresh_interval_secs = self.monitor.refresh_interval_secs,
                "Refresh interval outside the recommended {}-{}s range",
                MIN_RECOMMENDED_INTERVAL_SECS,
                MAX_RECOMMENDED_INTERVAL_SECS
            );
        }

        Ok(())
    }

    /// Resolve the metric catalog: file override or the standard one
    pub fn catalog(&self) -> MetricCatalog {
        if self.groups.is_empty() {
            MetricCatalog::standard()
        } else {
            MetricCatalog::new(
                self.groups
                    .iter()
                    .map(|g| MetricGroup {
                        name: g.name.clone(),
                        metrics: g.metrics.clone(),
                    })
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SkywatchConfig::default();
        assert_eq!(config.monitor.refresh_interval_secs, 30);
        assert_eq!(config.monitor.lookback_secs, 300);
        assert!(config.validate().is_ok());
        assert_eq!(config.catalog().groups().len(), 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = SkywatchConfig::default();
        config.monitor.refresh_interval_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRefreshInterval));
    }

    #[test]
    fn test_empty_group_rejected() {
        let mut config = SkywatchConfig::default();
        config.groups.push(GroupConfig {
            name: "Empty".to_string(),
            metrics: Vec::new(),
        });
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyGroup("Empty".to_string()))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [monitor]
            region = "us-east-1"
            refresh_interval_secs = 60

            [[groups]]
            name = "CPU"
            metrics = [{{ namespace = "AWS/EC2", name = "CPUUtilization", unit = "Percent" }}]
            "#
        )
        .unwrap();

        let config = SkywatchConfig::load(file.path()).unwrap();
        assert_eq!(config.monitor.region, "us-east-1");
        assert_eq!(config.monitor.refresh_interval_secs, 60);
        // Period and retention fall back to defaults
        assert_eq!(config.monitor.period_secs, 300);
        assert_eq!(config.catalog().groups().len(), 1);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = SkywatchConfig::load("/nonexistent/skywatch.toml").unwrap();
        assert_eq!(config.monitor.refresh_interval_secs, 30);
    }
}
