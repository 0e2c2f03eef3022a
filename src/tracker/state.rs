use serde::{Deserialize, Serialize};

use crate::db::models::ActiveActivity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    Idle,
    Active,
}

impl Default for TrackerStatus {
    fn default() -> Self {
        TrackerStatus::Idle
    }
}

/// Point-in-time view of the recorder for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub status: TrackerStatus,
    pub current: Option<ActiveActivity>,
    /// Seconds since the current activity started
    pub elapsed_secs: Option<f64>,
    pub history_len: usize,
    pub prediction_count: usize,
    pub confidence_threshold: f64,
}
