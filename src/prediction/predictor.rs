use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::db::models::ActivityRecord;
use crate::prediction::analyzer::{analyze_activity, group_by_activity};
use crate::prediction::config::PredictionConfig;
use crate::prediction::types::{ActivityPattern, Prediction};

/// Main prediction function: history in, confidence-ranked forecasts out.
///
/// Activities below `config.min_samples` are skipped entirely. The result is sorted
/// by descending confidence; order among equal confidences is unspecified.
pub fn generate_predictions<Tz: TimeZone>(
    history: &[ActivityRecord],
    now: &DateTime<Tz>,
    config: &PredictionConfig,
) -> Vec<Prediction> {
    let mut predictions = Vec::new();

    for (activity_name, records) in group_by_activity(history) {
        if let Some(pattern) = analyze_activity(activity_name, &records, config) {
            predictions.extend(predict_from_pattern(&pattern, now, config));
        }
    }

    predictions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    predictions
}

/// Forecast one activity over the next `config.horizon_days` days, today included.
pub fn predict_from_pattern<Tz: TimeZone>(
    pattern: &ActivityPattern,
    now: &DateTime<Tz>,
    config: &PredictionConfig,
) -> Vec<Prediction> {
    let threshold = config.confidence_threshold;
    let (likely_hour, max_hour_confidence) = pattern.most_likely_hour();
    let today = now.date_naive();
    let tz = now.timezone();

    let mut predictions = Vec::new();

    for day_offset in 0..config.horizon_days {
        let date = today + Duration::days(i64::from(day_offset));

        let day_confidence =
            pattern.day_distribution[date.weekday().num_days_from_sunday() as usize];
        if day_confidence < threshold / 2.0 {
            continue;
        }

        if max_hour_confidence < threshold / 2.0 {
            continue;
        }

        let confidence = (day_confidence + max_hour_confidence) / 2.0;
        if confidence < threshold {
            continue;
        }

        // A local time skipped by a DST jump has no instant; ambiguous ones take the first.
        let Some(candidate) = date
            .and_hms_opt(likely_hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        else {
            continue;
        };

        // Today's slot may already be gone; it does not roll over to next week.
        if candidate < *now {
            continue;
        }

        predictions.push(Prediction {
            activity_name: pattern.activity_name.clone(),
            predicted_time: candidate.with_timezone(&Utc),
            confidence,
            expected_duration_secs: pattern.duration.mean_secs,
            duration_std_dev: pattern.duration.std_dev_secs,
        });
    }

    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Weekday};

    fn sessions(name: &str, starts: &[DateTime<Utc>], minutes: i64) -> Vec<ActivityRecord> {
        starts
            .iter()
            .map(|start| {
                ActivityRecord::new(name, start, &(*start + Duration::minutes(minutes))).unwrap()
            })
            .collect()
    }

    fn mondays_at_seven() -> Vec<DateTime<Utc>> {
        // 2024-01-01 and the four Mondays after it
        (0..5)
            .map(|week| Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap() + Duration::weeks(week))
            .collect()
    }

    fn config(threshold: f64) -> PredictionConfig {
        PredictionConfig::default().with_threshold(threshold).unwrap()
    }

    #[test]
    fn predicts_next_monday_from_five_mondays() {
        let history = sessions("Exercise", &mondays_at_seven(), 30);
        // Sunday evening
        let now = Utc.with_ymd_and_hms(2024, 2, 4, 20, 0, 0).unwrap();

        let predictions = generate_predictions(&history, &now, &config(0.5));

        assert_eq!(predictions.len(), 1);
        let prediction = &predictions[0];
        assert_eq!(prediction.activity_name, "Exercise");
        assert_eq!(
            prediction.predicted_time,
            Utc.with_ymd_and_hms(2024, 2, 5, 7, 0, 0).unwrap()
        );
        assert_eq!(prediction.predicted_time.weekday(), Weekday::Mon);
        assert!((prediction.confidence - 1.0).abs() < 1e-9);
        assert!((prediction.expected_duration_secs - 1800.0).abs() < 1e-9);
        assert_eq!(prediction.duration_std_dev, 0.0);
    }

    #[test]
    fn four_sessions_are_not_enough() {
        let starts = &mondays_at_seven()[..4];
        let history = sessions("Reading", starts, 45);
        let now = Utc.with_ymd_and_hms(2024, 2, 4, 20, 0, 0).unwrap();

        for threshold in [0.0, 0.1, 0.5, 1.0] {
            let predictions = generate_predictions(&history, &now, &config(threshold));
            assert!(predictions.iter().all(|p| p.activity_name != "Reading"));
        }
    }

    #[test]
    fn passed_slot_today_is_skipped_without_rollover() {
        let history = sessions("Exercise", &mondays_at_seven(), 30);
        // Monday 08:00, an hour after the usual slot
        let now = Utc.with_ymd_and_hms(2024, 2, 5, 8, 0, 0).unwrap();

        let predictions = generate_predictions(&history, &now, &config(0.5));
        // Only Monday qualifies and today's 07:00 is gone; next Monday is outside the horizon.
        assert!(predictions.is_empty());
    }

    #[test]
    fn slot_exactly_now_is_kept() {
        let history = sessions("Exercise", &mondays_at_seven(), 30);
        let now = Utc.with_ymd_and_hms(2024, 2, 5, 7, 0, 0).unwrap();

        let predictions = generate_predictions(&history, &now, &config(0.5));
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].predicted_time, now);
    }

    #[test]
    fn weak_days_are_prefiltered() {
        // Five sessions at 09:00 spread over five weekdays: each day has p = 0.2
        let starts: Vec<_> = (1..=5)
            .map(|day| Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap())
            .collect();
        let history = sessions("Standup", &starts, 15);
        let now = Utc.with_ymd_and_hms(2024, 2, 4, 0, 0, 0).unwrap();

        // day 0.2 < 0.6 / 2 ⇒ nothing
        assert!(generate_predictions(&history, &now, &config(0.6)).is_empty());

        // At 0.4 every weekday passes: (0.2 + 1.0) / 2 = 0.6 ≥ 0.4
        let predictions = generate_predictions(&history, &now, &config(0.4));
        assert_eq!(predictions.len(), 5);
        for prediction in &predictions {
            assert!((prediction.confidence - 0.6).abs() < 1e-9);
            assert_eq!(prediction.predicted_time.hour(), 9);
            assert!(prediction.predicted_time >= now);
        }
    }

    #[test]
    fn sorted_by_descending_confidence() {
        let mut history = sessions("Exercise", &mondays_at_seven(), 30);
        // Reading: three Mondays, two Tuesdays, always 21:00
        let reading: Vec<_> = [1, 8, 15, 2, 9]
            .iter()
            .map(|&day| Utc.with_ymd_and_hms(2024, 1, day, 21, 0, 0).unwrap())
            .collect();
        history.extend(sessions("Reading", &reading, 40));

        let now = Utc.with_ymd_and_hms(2024, 2, 4, 20, 0, 0).unwrap();
        let predictions = generate_predictions(&history, &now, &config(0.5));

        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].activity_name, "Exercise");
        for pair in predictions.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        for prediction in &predictions {
            assert!(prediction.confidence >= 0.5 && prediction.confidence <= 1.0);
        }
    }

    #[test]
    fn hours_follow_the_callers_time_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let starts: Vec<_> = (0..5)
            .map(|week| {
                tz.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap() + Duration::weeks(week)
            })
            .collect();
        let history: Vec<_> = starts
            .iter()
            .map(|start| {
                ActivityRecord::new("Exercise", start, &(*start + Duration::minutes(30))).unwrap()
            })
            .collect();

        let now = tz.with_ymd_and_hms(2024, 2, 4, 20, 0, 0).unwrap();
        let predictions = generate_predictions(&history, &now, &config(0.5));

        assert_eq!(predictions.len(), 1);
        assert_eq!(
            predictions[0].predicted_time,
            Utc.with_ymd_and_hms(2024, 2, 5, 5, 0, 0).unwrap()
        );
    }
}
