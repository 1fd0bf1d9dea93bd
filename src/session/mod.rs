// Monitoring session state
// Explicit per-session ownership of the accumulated group histories

use crate::history::{HistorySnapshot, PollEvent, SeriesHistory};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Live history plus its published read-consistent snapshot
/// The poller is the only writer; renderers and other readers only
/// ever see the last published snapshot, never the mutable buffer
struct GroupSeries {
    history: Mutex<SeriesHistory>,
    published: ArcSwap<Vec<PollEvent>>,
}

/// One monitoring session for one resource
///
/// Owned by the caller and passed by handle into the poller and the
/// renderer. Dropped when monitoring ends; nothing is persisted.
pub struct MonitorSession {
    id: Uuid,
    resource_id: String,
    region: String,
    started_at: DateTime<Utc>,
    retention_events: usize,
    groups: DashMap<String, Arc<GroupSeries>>,
}

impl MonitorSession {
    pub fn new(resource_id: &str, region: &str, retention_events: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id: resource_id.to_string(),
            region: region.to_string(),
            started_at: Utc::now(),
            retention_events,
            groups: DashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append a poll event to a group's history and publish the
    /// updated snapshot. Returns None if the event was rejected for
    /// violating the strictly-increasing timestamp invariant.
    pub fn record(&self, group: &str, event: PollEvent) -> Option<HistorySnapshot> {
        let series = self
            .groups
            .entry(group.to_string())
            .or_insert_with(|| {
                Arc::new(GroupSeries {
                    history: Mutex::new(SeriesHistory::new(self.retention_events)),
                    published: ArcSwap::from_pointee(Vec::new()),
                })
            })
            .clone();

        let mut history = series.history.lock();
        if !history.append(event) {
            return None;
        }
        let snapshot = history.snapshot();
        series.published.store(snapshot.clone());
        Some(snapshot)
    }

    /// Wait-free read of a group's last published snapshot
    pub fn snapshot(&self, group: &str) -> Option<HistorySnapshot> {
        self.groups.get(group).map(|series| series.published.load_full())
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Sample;
    use chrono::TimeZone;

    fn event(secs: i64) -> PollEvent {
        PollEvent {
            at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            samples: vec![Sample {
                metric: "NetworkIn".to_string(),
                timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
                average: 1024.0,
                unit: "Bytes".to_string(),
            }],
        }
    }

    #[test]
    fn test_session_identity() {
        let before = Utc::now();
        let session = MonitorSession::new("i-0123", "eu-north-1", 16);

        assert_eq!(session.resource_id(), "i-0123");
        assert_eq!(session.region(), "eu-north-1");
        assert!(session.started_at() >= before);
        assert!(session.started_at() <= Utc::now());
    }

    #[test]
    fn test_record_publishes_snapshot() {
        let session = MonitorSession::new("i-0123", "eu-north-1", 16);
        let snapshot = session.record("Network", event(0)).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.snapshot("Network").unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_read_consistency() {
        let session = MonitorSession::new("i-0123", "eu-north-1", 16);
        session.record("Network", event(0)).unwrap();
        let before = session.snapshot("Network").unwrap();

        session.record("Network", event(30)).unwrap();

        // A reader holding the old snapshot never observes the append
        assert_eq!(before.len(), 1);
        assert_eq!(session.snapshot("Network").unwrap().len(), 2);
    }

    #[test]
    fn test_out_of_order_event_rejected() {
        let session = MonitorSession::new("i-0123", "eu-north-1", 16);
        assert!(session.record("Network", event(30)).is_some());
        assert!(session.record("Network", event(0)).is_none());
        assert_eq!(session.snapshot("Network").unwrap().len(), 1);
    }

    #[test]
    fn test_groups_are_independent() {
        let session = MonitorSession::new("i-0123", "eu-north-1", 16);
        session.record("Network", event(0)).unwrap();
        session.record("CPU", event(0)).unwrap();

        assert_eq!(session.group_names().len(), 2);
        assert!(session.snapshot("Disk Operations").is_none());
    }
}
