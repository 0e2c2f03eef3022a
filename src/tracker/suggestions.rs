use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::db::models::{Routine, TimeOfDay};
use crate::prediction::Prediction;

/// Minutes around a routine's start in which it is suggested.
pub const ROUTINE_WINDOW_MINUTES: i64 = 5;
/// Minutes around a predicted time in which it is suggested.
pub const PREDICTION_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Suggestion {
    #[serde(rename_all = "camelCase")]
    Routine {
        routine_id: String,
        name: String,
        activity: String,
    },
    #[serde(rename_all = "camelCase")]
    Prediction {
        activity: String,
        predicted_time: DateTime<Utc>,
        confidence: f64,
    },
}

/// Decides which routines and predictions are due right now. Each one is suggested at
/// most once per day for the lifetime of the checker.
#[derive(Debug, Default)]
pub struct SuggestionChecker {
    /// Keys already suggested on `day`; dropped when the day changes
    shown: HashSet<String>,
    day: Option<NaiveDate>,
}

impl SuggestionChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        routines: &[Routine],
        predictions: &[Prediction],
        threshold: f64,
    ) -> Vec<Suggestion> {
        let today = now.date_naive();
        if self.day != Some(today) {
            self.shown.clear();
            self.day = Some(today);
        }
        let weekday = now.weekday();
        let now_utc = now.with_timezone(&Utc);
        let mut due = Vec::new();

        // `now` always has a valid hour and minute
        if let Ok(current) = TimeOfDay::from_hm(now.hour(), now.minute()) {
            for routine in routines {
                if !routine.runs_on(weekday) || !routine.is_active_at(current) {
                    continue;
                }
                if (current.minutes() - routine.start.minutes()).abs() > ROUTINE_WINDOW_MINUTES {
                    continue;
                }

                let key = format!("routine:{}:{}", routine.id, today);
                if self.shown.insert(key) {
                    due.push(Suggestion::Routine {
                        routine_id: routine.id.clone(),
                        name: routine.name.clone(),
                        activity: routine.activity.clone(),
                    });
                }
            }
        }

        for prediction in predictions {
            let local = prediction.predicted_time.with_timezone(&now.timezone());
            if local.date_naive() != today {
                continue;
            }
            let distance_ms = (prediction.predicted_time - now_utc).num_milliseconds().abs();
            if distance_ms > Duration::minutes(PREDICTION_WINDOW_MINUTES).num_milliseconds() {
                continue;
            }
            if prediction.confidence < threshold {
                continue;
            }

            let key = format!(
                "prediction:{}:{}:{}",
                prediction.activity_name,
                today,
                local.hour()
            );
            if self.shown.insert(key) {
                due.push(Suggestion::Prediction {
                    activity: prediction.activity_name.clone(),
                    predicted_time: prediction.predicted_time,
                    confidence: prediction.confidence,
                });
            }
        }

        due
    }

    /// Forget which suggestions were already made.
    pub fn reset(&mut self) {
        self.shown.clear();
        self.day = None;
    }
}
