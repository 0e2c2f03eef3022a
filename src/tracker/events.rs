use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::ActivityRecord;
use crate::prediction::Prediction;

use super::state::TrackerSnapshot;
use super::suggestions::Suggestion;

/// Everything the tracker tells its host about. Delivered over a broadcast channel;
/// slow receivers may miss events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    StateChanged {
        snapshot: TrackerSnapshot,
    },
    ActivityRecorded {
        record: ActivityRecord,
    },
    PredictionsUpdated {
        predictions: Vec<Prediction>,
    },
    Suggestion {
        suggestion: Suggestion,
    },
    #[serde(rename_all = "camelCase")]
    Reminder {
        reminder_id: String,
        activity: String,
        activity_time: DateTime<Utc>,
        lead_minutes: i64,
    },
}
