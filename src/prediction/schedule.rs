use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::prediction::types::Prediction;

/// Today's predictions in time order.
///
/// Keeps predictions in `[start of today, start of tomorrow)` for `now`'s local day.
/// Overlapping or duplicate slots are all kept.
pub fn build_today_schedule<Tz: TimeZone>(
    predictions: &[Prediction],
    now: &DateTime<Tz>,
) -> Vec<Prediction> {
    let (day_start, day_end) = local_day_bounds(now);

    let mut today: Vec<Prediction> = predictions
        .iter()
        .filter(|p| p.predicted_time >= day_start && p.predicted_time < day_end)
        .cloned()
        .collect();

    today.sort_by_key(|p| p.predicted_time);
    today
}

/// Start of `now`'s local day and start of the next one.
pub fn local_day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today + Duration::days(1);
    (start_of_day(&tz, today), start_of_day(&tz, tomorrow))
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    // Some zones skip midnight on DST days; the day then starts at the first valid hour.
    for hour in 0..3 {
        if let Some(local) = date
            .and_hms_opt(hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        {
            return local.with_timezone(&Utc);
        }
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn prediction(name: &str, at: DateTime<Utc>) -> Prediction {
        Prediction {
            activity_name: name.into(),
            predicted_time: at,
            confidence: 0.8,
            expected_duration_secs: 1800.0,
            duration_std_dev: 0.0,
        }
    }

    #[test]
    fn keeps_only_today_in_time_order() {
        let at = |d, h| Utc.with_ymd_and_hms(2024, 2, d, h, 0, 0).unwrap();
        let predictions = vec![
            prediction("Reading", at(5, 21)),
            prediction("Exercise", at(5, 7)),
            prediction("Exercise", at(6, 7)),
            prediction("Lunch", at(5, 12)),
            prediction("Late", at(4, 23)),
        ];
        let now = at(5, 6);

        let schedule = build_today_schedule(&predictions, &now);
        let names: Vec<_> = schedule.iter().map(|p| p.activity_name.as_str()).collect();
        assert_eq!(names, vec!["Exercise", "Lunch", "Reading"]);
        for pair in schedule.windows(2) {
            assert!(pair[0].predicted_time <= pair[1].predicted_time);
        }
    }

    #[test]
    fn tomorrow_midnight_is_excluded_and_duplicates_kept() {
        let at = |d, h| Utc.with_ymd_and_hms(2024, 2, d, h, 0, 0).unwrap();
        let predictions = vec![
            prediction("A", at(5, 9)),
            prediction("B", at(5, 9)),
            prediction("C", at(6, 0)),
            prediction("D", at(5, 0)),
        ];
        let schedule = build_today_schedule(&predictions, &at(5, 15));
        assert_eq!(schedule.len(), 3);
        assert!(schedule.iter().all(|p| p.activity_name != "C"));
    }

    #[test]
    fn day_bounds_use_local_midnight() {
        let tz = FixedOffset::west_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 2, 5, 23, 0, 0).unwrap();
        let (start, end) = local_day_bounds(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 5, 8, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 6, 8, 0, 0).unwrap());
    }
}
