//! Routine data models.
//!
//! A routine is a user-declared recurring block ("Gym, mon/wed/fri, 07:00-08:00").
//! Routines are not learned; they feed the suggestion checker alongside predictions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Minutes past midnight, serialized as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, InputError> {
        if hour > 23 || minute > 59 {
            return Err(InputError::InvalidTimeOfDay(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0) / 60
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0) % 60
    }
}

impl FromStr for TimeOfDay {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InputError::InvalidTimeOfDay(value.to_string());
        let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hours.parse().map_err(|_| invalid())?;
        let minute: u32 = minutes.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub activity: String,
    pub days: Vec<Weekday>,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Routine {
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// A routine whose start is after its end wraps past midnight.
    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    /// Inclusive on both ends.
    pub fn is_active_at(&self, time: TimeOfDay) -> bool {
        if self.is_overnight() {
            time >= self.start || time <= self.end
        } else {
            time >= self.start && time <= self.end
        }
    }
}

/// Input data for creating or updating a routine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineInput {
    pub name: String,
    pub activity: String,
    pub days: Vec<Weekday>,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

pub mod validation {
    use super::RoutineInput;
    use crate::error::InputError;

    /// Trim text fields, sort days Sunday-first and drop duplicates.
    pub fn normalize(input: RoutineInput) -> Result<RoutineInput, InputError> {
        let name = input.name.trim().to_string();
        let activity = input.activity.trim().to_string();
        if name.is_empty() || activity.is_empty() {
            return Err(InputError::EmptyName);
        }

        let mut days = input.days;
        days.sort_by_key(|day| day.num_days_from_sunday());
        days.dedup();
        if days.is_empty() {
            return Err(InputError::NoDays);
        }

        Ok(RoutineInput {
            name,
            activity,
            days,
            start: input.start,
            end: input.end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine(start: &str, end: &str) -> Routine {
        let now = Utc::now();
        Routine {
            id: "r1".into(),
            name: "Night shift".into(),
            activity: "Work".into(),
            days: vec![Weekday::Mon],
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn parses_and_formats_time_of_day() {
        let time: TimeOfDay = "7:05".parse().unwrap();
        assert_eq!(time.minutes(), 425);
        assert_eq!(time.to_string(), "07:05");

        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn daytime_range_is_inclusive() {
        let r = routine("09:00", "17:00");
        assert!(r.is_active_at("09:00".parse().unwrap()));
        assert!(r.is_active_at("17:00".parse().unwrap()));
        assert!(!r.is_active_at("17:01".parse().unwrap()));
        assert!(!r.is_active_at("08:59".parse().unwrap()));
    }

    #[test]
    fn overnight_range_wraps_midnight() {
        let r = routine("22:00", "06:00");
        assert!(r.is_overnight());
        assert!(r.is_active_at("23:30".parse().unwrap()));
        assert!(r.is_active_at("05:00".parse().unwrap()));
        assert!(!r.is_active_at("12:00".parse().unwrap()));
    }

    #[test]
    fn normalize_rejects_missing_fields() {
        let input = RoutineInput {
            name: "  Gym ".into(),
            activity: "Exercise".into(),
            days: vec![Weekday::Fri, Weekday::Mon, Weekday::Fri],
            start: "07:00".parse().unwrap(),
            end: "08:00".parse().unwrap(),
        };
        let normalized = validation::normalize(input.clone()).unwrap();
        assert_eq!(normalized.name, "Gym");
        assert_eq!(normalized.days, vec![Weekday::Mon, Weekday::Fri]);

        let no_days = RoutineInput {
            days: Vec::new(),
            ..input.clone()
        };
        assert_eq!(validation::normalize(no_days).unwrap_err(), InputError::NoDays);

        let blank = RoutineInput {
            activity: " ".into(),
            ..input
        };
        assert_eq!(validation::normalize(blank).unwrap_err(), InputError::EmptyName);
    }
}
