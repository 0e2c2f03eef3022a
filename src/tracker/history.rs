use crate::db::models::ActivityRecord;

/// Append-only record list with a fixed capacity; the oldest record goes first.
#[derive(Debug, Clone)]
pub struct ActivityHistory {
    records: Vec<ActivityRecord>,
    capacity: usize,
}

impl ActivityHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Seed from persisted records (oldest first), keeping only the newest `capacity`.
    pub fn from_records(mut records: Vec<ActivityRecord>, capacity: usize) -> Self {
        if records.len() > capacity {
            records.drain(..records.len() - capacity);
        }
        Self { records, capacity }
    }

    /// Append a record. Returns the evicted record when the cap was exceeded.
    pub fn push(&mut self, record: ActivityRecord) -> Option<ActivityRecord> {
        self.records.push(record);

        if self.records.len() > self.capacity {
            Some(self.records.remove(0))
        } else {
            None
        }
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(minute_offset: i64) -> ActivityRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + Duration::minutes(minute_offset * 2);
        ActivityRecord::new("Work", &start, &(start + Duration::minutes(1))).unwrap()
    }

    #[test]
    fn evicts_exactly_the_oldest_at_capacity() {
        let mut history = ActivityHistory::new(100);
        for i in 0..100 {
            assert!(history.push(record(i)).is_none());
        }
        assert_eq!(history.len(), 100);

        let newest = record(100);
        let evicted = history.push(newest.clone()).unwrap();

        assert_eq!(evicted, record(0));
        assert_eq!(history.len(), 100);
        assert_eq!(history.records()[0], record(1));
        assert_eq!(history.records().last(), Some(&newest));
        assert!(!history.records().contains(&record(0)));
    }

    #[test]
    fn from_records_keeps_newest() {
        let records: Vec<_> = (0..10).map(record).collect();
        let history = ActivityHistory::from_records(records, 4);
        assert_eq!(history.len(), 4);
        assert_eq!(history.records()[0], record(6));
        assert_eq!(history.capacity(), 4);
    }
}
