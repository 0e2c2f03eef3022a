use std::collections::BTreeMap;

use crate::db::models::ActivityRecord;
use crate::prediction::config::PredictionConfig;
use crate::prediction::types::{ActivityPattern, DurationStats};

/// Group records by activity name. Record order within a group follows history order.
pub fn group_by_activity(history: &[ActivityRecord]) -> BTreeMap<&str, Vec<&ActivityRecord>> {
    let mut groups: BTreeMap<&str, Vec<&ActivityRecord>> = BTreeMap::new();
    for record in history {
        groups.entry(record.activity_name()).or_default().push(record);
    }
    groups
}

/// Build the pattern for one already-grouped activity.
/// Returns `None` below `config.min_samples`; that is a hard floor.
pub fn analyze_activity(
    activity_name: &str,
    records: &[&ActivityRecord],
    config: &PredictionConfig,
) -> Option<ActivityPattern> {
    if records.is_empty() || records.len() < config.min_samples {
        return None;
    }

    Some(ActivityPattern {
        activity_name: activity_name.to_string(),
        sample_count: records.len(),
        day_distribution: day_distribution(records),
        hour_distribution: hour_distribution(records),
        duration: duration_stats(records),
    })
}

/// Share of sessions per weekday. Every record counts equally regardless of age.
pub fn day_distribution(records: &[&ActivityRecord]) -> [f64; 7] {
    let mut counts = [0usize; 7];
    for record in records {
        counts[usize::from(record.day_of_week())] += 1;
    }
    normalize(counts, records.len())
}

pub fn hour_distribution(records: &[&ActivityRecord]) -> [f64; 24] {
    let mut counts = [0usize; 24];
    for record in records {
        counts[usize::from(record.hour_of_day())] += 1;
    }
    normalize(counts, records.len())
}

/// Mean and population (not Bessel-corrected) standard deviation of durations.
pub fn duration_stats(records: &[&ActivityRecord]) -> DurationStats {
    if records.is_empty() {
        return DurationStats {
            mean_secs: 0.0,
            std_dev_secs: 0.0,
        };
    }

    let n = records.len() as f64;
    let mean = records.iter().map(|r| r.duration_secs()).sum::<f64>() / n;
    let variance = records
        .iter()
        .map(|r| {
            let diff = r.duration_secs() - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    DurationStats {
        mean_secs: mean,
        std_dev_secs: variance.sqrt(),
    }
}

fn normalize<const N: usize>(counts: [usize; N], total: usize) -> [f64; N] {
    let mut probabilities = [0.0; N];
    if total == 0 {
        return probabilities;
    }
    for (slot, count) in probabilities.iter_mut().zip(counts) {
        *slot = count as f64 / total as f64;
    }
    probabilities
}
