//! Activity data models.
//!
//! `ActivityRecord` is the only fact the predictor learns from. Day-of-week and
//! hour-of-day are derived once, in the caller's time zone, when the record is built.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::error::InputError;

/// A completed activity. Immutable once built.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    activity_name: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_secs: f64,
    day_of_week: u8,
    hour_of_day: u8,
}

impl ActivityRecord {
    /// Build a record from a start and end instant.
    ///
    /// `day_of_week` (0 = Sunday) and `hour_of_day` are taken from `start` in its own
    /// time zone.
    pub fn new<Tz: TimeZone>(
        activity_name: &str,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> Result<Self, InputError> {
        let activity_name = validate_name(activity_name)?;
        let start_utc = check_timestamp(start)?;
        let end_utc = check_timestamp(end)?;

        if end_utc < start_utc {
            return Err(InputError::EndBeforeStart {
                start: start_utc.to_rfc3339(),
                end: end_utc.to_rfc3339(),
            });
        }

        let duration_secs = (end_utc - start_utc).num_milliseconds() as f64 / 1000.0;

        Ok(Self {
            activity_name,
            start_time: start_utc,
            end_time: end_utc,
            duration_secs,
            day_of_week: start.weekday().num_days_from_sunday() as u8,
            hour_of_day: start.hour() as u8,
        })
    }

    /// Rebuild a record from persisted fields, re-checking every invariant.
    pub fn restore(
        activity_name: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration_secs: f64,
        day_of_week: i64,
        hour_of_day: i64,
    ) -> Result<Self, InputError> {
        let activity_name = validate_name(&activity_name)?;
        check_timestamp(&start_time)?;
        check_timestamp(&end_time)?;

        if end_time < start_time {
            return Err(InputError::EndBeforeStart {
                start: start_time.to_rfc3339(),
                end: end_time.to_rfc3339(),
            });
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(InputError::InvalidDuration(duration_secs));
        }
        // Durations are stored at millisecond precision
        let span_secs = (end_time - start_time).num_milliseconds() as f64 / 1000.0;
        if (duration_secs - span_secs).abs() > 0.001 {
            return Err(InputError::InvalidDuration(duration_secs));
        }
        if !(0..=6).contains(&day_of_week) {
            return Err(InputError::OutOfRange {
                field: "day_of_week",
                value: day_of_week,
            });
        }
        if !(0..=23).contains(&hour_of_day) {
            return Err(InputError::OutOfRange {
                field: "hour_of_day",
                value: hour_of_day,
            });
        }

        Ok(Self {
            activity_name,
            start_time,
            end_time,
            duration_secs,
            day_of_week: day_of_week as u8,
            hour_of_day: hour_of_day as u8,
        })
    }

    pub fn activity_name(&self) -> &str {
        &self.activity_name
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// 0 = Sunday, 6 = Saturday.
    pub fn day_of_week(&self) -> u8 {
        self.day_of_week
    }

    pub fn hour_of_day(&self) -> u8 {
        self.hour_of_day
    }
}

/// The activity currently being tracked.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveActivity {
    pub activity_name: String,
    pub started_at: DateTime<Utc>,
}

impl ActiveActivity {
    pub fn begin<Tz: TimeZone>(activity_name: &str, now: &DateTime<Tz>) -> Result<Self, InputError> {
        Ok(Self {
            activity_name: validate_name(activity_name)?,
            started_at: check_timestamp(now)?,
        })
    }

    /// Seconds since the activity started; never negative.
    pub fn elapsed_secs<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> f64 {
        let elapsed = now.with_timezone(&Utc) - self.started_at;
        (elapsed.num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    /// Turn the activity into a record ending at `now`. The start is re-read in
    /// `now`'s time zone so the derived day and hour are local.
    pub fn finish<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<ActivityRecord, InputError> {
        let start = self.started_at.with_timezone(&now.timezone());
        ActivityRecord::new(&self.activity_name, &start, now)
    }
}

fn validate_name(name: &str) -> Result<String, InputError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn check_timestamp<Tz: TimeZone>(value: &DateTime<Tz>) -> Result<DateTime<Utc>, InputError> {
    let utc = value.with_timezone(&Utc);
    if utc.timestamp() < 0 {
        return Err(InputError::InvalidTimestamp(utc.to_rfc3339()));
    }
    Ok(utc)
}
