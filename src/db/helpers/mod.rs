use anyhow::{Context, Result};
use chrono::{DateTime, Utc, Weekday};

use crate::db::models::TimeOfDay;
use crate::error::InputError;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_time_of_day(value: &str, field: &str) -> Result<TimeOfDay> {
    value
        .parse()
        .with_context(|| format!("failed to parse {field}"))
}

pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "sun",
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
    }
}

pub fn parse_weekday_code(value: &str) -> Result<Weekday> {
    match value {
        "sun" => Ok(Weekday::Sun),
        "mon" => Ok(Weekday::Mon),
        "tue" => Ok(Weekday::Tue),
        "wed" => Ok(Weekday::Wed),
        "thu" => Ok(Weekday::Thu),
        "fri" => Ok(Weekday::Fri),
        "sat" => Ok(Weekday::Sat),
        other => Err(InputError::InvalidWeekday(other.to_string()).into()),
    }
}

/// Routine days are stored as a comma list, e.g. `mon,wed,fri`.
pub fn encode_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|day| weekday_code(*day))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn decode_days(value: &str) -> Result<Vec<Weekday>> {
    value
        .split(',')
        .filter(|code| !code.is_empty())
        .map(parse_weekday_code)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_list_round_trip() {
        let days = vec![Weekday::Mon, Weekday::Wed, Weekday::Sun];
        let encoded = encode_days(&days);
        assert_eq!(encoded, "mon,wed,sun");
        assert_eq!(decode_days(&encoded).unwrap(), days);
        assert!(decode_days("mon,funday").is_err());
        assert!(decode_days("").unwrap().is_empty());
    }
}
