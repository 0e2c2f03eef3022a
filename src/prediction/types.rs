use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forecast occurrence of an activity. Recomputed from history, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub activity_name: String,
    pub predicted_time: DateTime<Utc>,
    pub confidence: f64,
    pub expected_duration_secs: f64,
    pub duration_std_dev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub mean_secs: f64,
    /// Population standard deviation
    pub std_dev_secs: f64,
}

/// Empirical distributions for one activity name.
#[derive(Debug, Clone)]
pub struct ActivityPattern {
    pub activity_name: String,
    pub sample_count: usize,
    /// Indexed by day of week, 0 = Sunday
    pub day_distribution: [f64; 7],
    pub hour_distribution: [f64; 24],
    pub duration: DurationStats,
}

impl ActivityPattern {
    /// The single most probable hour and its probability. Ties go to the earliest hour.
    pub fn most_likely_hour(&self) -> (u32, f64) {
        let mut likely_hour = 0;
        let mut max_confidence = 0.0;
        for (hour, &confidence) in self.hour_distribution.iter().enumerate() {
            if confidence > max_confidence {
                max_confidence = confidence;
                likely_hour = hour as u32;
            }
        }
        (likely_hour, max_confidence)
    }
}
