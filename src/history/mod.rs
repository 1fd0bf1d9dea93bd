// Bounded per-group series history
// Ring buffer of poll events with strictly increasing timestamps

use crate::metrics::Sample;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// All samples gathered for one metric group during one tick
/// An event is recorded even when no metric produced a sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollEvent {
    pub at: DateTime<Utc>,
    pub samples: Vec<Sample>,
}

impl PollEvent {
    pub fn sample(&self, metric: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.metric == metric)
    }
}

/// Immutable view of a history handed to renderers
/// Cloning is an Arc bump, so consumers can hold snapshots freely
pub type HistorySnapshot = Arc<Vec<PollEvent>>;

/// Ordered sequence of poll events for one metric group
///
/// Retention is bounded: once `capacity` events are held, appending
/// evicts the oldest. Append rejects events that do not advance the
/// timestamp, preserving the strictly-increasing invariant.
#[derive(Debug)]
pub struct SeriesHistory {
    events: VecDeque<PollEvent>,
    capacity: usize,
}

impl SeriesHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Append a poll event, evicting the oldest at capacity
    /// Returns false (and leaves the history untouched) if the event's
    /// timestamp is not strictly after the newest held event
    pub fn append(&mut self, event: PollEvent) -> bool {
        if let Some(last) = self.events.back() {
            if event.at <= last.at {
                return false;
            }
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&PollEvent> {
        self.events.back()
    }

    pub fn events(&self) -> impl Iterator<Item = &PollEvent> {
        self.events.iter()
    }

    /// Copy-on-read snapshot for concurrent consumers
    pub fn snapshot(&self) -> HistorySnapshot {
        Arc::new(self.events.iter().cloned().collect())
    }
}

/// Extract the (timestamp, value) series for one metric across a snapshot
pub fn series(events: &[PollEvent], metric: &str) -> Vec<(DateTime<Utc>, f64)> {
    events
        .iter()
        .filter_map(|event| event.sample(metric).map(|s| (s.timestamp, s.average)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(secs: i64, samples: Vec<Sample>) -> PollEvent {
        PollEvent {
            at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            samples,
        }
    }

    fn cpu_sample(secs: i64, average: f64) -> Sample {
        Sample {
            metric: "CPUUtilization".to_string(),
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            average,
            unit: "Percent".to_string(),
        }
    }

    #[test]
    fn test_append_in_order() {
        let mut history = SeriesHistory::new(16);
        assert!(history.append(event(0, Vec::new())));
        assert!(history.append(event(30, Vec::new())));
        assert!(history.append(event(60, Vec::new())));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_append_rejects_non_increasing() {
        let mut history = SeriesHistory::new(16);
        assert!(history.append(event(30, Vec::new())));
        assert!(!history.append(event(30, Vec::new())));
        assert!(!history.append(event(0, Vec::new())));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = SeriesHistory::new(3);
        for i in 0..5 {
            assert!(history.append(event(i * 30, Vec::new())));
        }
        assert_eq!(history.len(), 3);
        // Oldest two evicted, newest three retained in order
        let times: Vec<_> = history.events().map(|e| e.at).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(history.latest().unwrap().at, event(120, Vec::new()).at);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut history = SeriesHistory::new(16);
        history.append(event(0, vec![cpu_sample(0, 42.0)]));
        let snapshot = history.snapshot();

        history.append(event(30, vec![cpu_sample(30, 50.0)]));

        // The earlier snapshot is unaffected by later appends
        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_series_extraction() {
        let mut history = SeriesHistory::new(16);
        history.append(event(0, vec![cpu_sample(0, 42.0)]));
        history.append(event(30, Vec::new()));
        history.append(event(60, vec![cpu_sample(60, 55.0)]));

        let snapshot = history.snapshot();
        let points = series(&snapshot, "CPUUtilization");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].1, 42.0);
        assert_eq!(points[1].1, 55.0);
    }
}
