use thiserror::Error;

/// Malformed input rejected at the crate boundary.
///
/// Ordinary misuse (stopping while idle, starting while another activity runs,
/// too little history) is not an error and never produces one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("timestamp {0} is before the Unix epoch")]
    InvalidTimestamp(String),

    #[error("end time {end} is before start time {start}")]
    EndBeforeStart { start: String, end: String },

    #[error("activity name must not be empty")]
    EmptyName,

    #[error("duration {0} is not a finite, non-negative number of seconds")]
    InvalidDuration(f64),

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("confidence threshold {0} must be a finite value in [0, 1]")]
    InvalidThreshold(f64),

    #[error("sensitivity {0} must be between 1 and 10")]
    InvalidSensitivity(u8),

    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidTimeOfDay(String),

    #[error("unknown weekday '{0}'")]
    InvalidWeekday(String),

    #[error("routine must run on at least one day")]
    NoDays,

    #[error("cannot set reminder for past time {0}")]
    ReminderInPast(String),
}
