use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use log::{debug, info, warn};

use crate::db::models::{ActiveActivity, ActivityRecord};
use crate::prediction::{build_today_schedule, generate_predictions, PredictionConfig, Prediction};
use crate::utils::format_duration;

use super::history::ActivityHistory;
use super::state::{TrackerSnapshot, TrackerStatus};
use super::store::HistoryStore;

/// Tracks the single current activity and turns finished ones into history.
///
/// Everything here is synchronous: once `stop_activity` returns, the history is
/// persisted and `predictions()` reflects it. Callers sharing a recorder across
/// threads must put it behind one lock.
pub struct ActivityRecorder {
    store: Arc<dyn HistoryStore>,
    config: PredictionConfig,
    history: ActivityHistory,
    current: Option<ActiveActivity>,
    predictions: Vec<Prediction>,
}

impl ActivityRecorder {
    /// Load history from `store` and compute the initial predictions.
    ///
    /// An activity still marked in progress (the process died mid-activity) is
    /// discarded: there is no trustworthy end time for it.
    pub fn open<Tz: TimeZone>(
        store: Arc<dyn HistoryStore>,
        config: PredictionConfig,
        now: &DateTime<Tz>,
    ) -> Result<Self> {
        let mut records = store.load().context("failed to load activity history")?;
        let loaded = records.len();
        records.retain(|record| record.duration_secs() >= config.min_duration_secs);
        if records.len() < loaded {
            warn!(
                "Ignoring {} stored activities shorter than {}s",
                loaded - records.len(),
                config.min_duration_secs
            );
        }
        let history = ActivityHistory::from_records(records, config.max_history);

        if let Some(stale) = store
            .load_active()
            .context("failed to load in-progress activity")?
        {
            warn!(
                "Recovered interrupted activity '{}' started at {}; discarding",
                stale.activity_name, stale.started_at
            );
            store
                .save_active(None)
                .context("failed to clear interrupted activity")?;
        }

        let mut recorder = Self {
            store,
            config,
            history,
            current: None,
            predictions: Vec::new(),
        };
        recorder.refresh_predictions(now);

        info!(
            "Activity recorder ready with {} records and {} predictions",
            recorder.history.len(),
            recorder.predictions.len()
        );

        Ok(recorder)
    }

    pub fn status(&self) -> TrackerStatus {
        if self.current.is_some() {
            TrackerStatus::Active
        } else {
            TrackerStatus::Idle
        }
    }

    pub fn current(&self) -> Option<&ActiveActivity> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[ActivityRecord] {
        self.history.records()
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    pub fn snapshot<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> TrackerSnapshot {
        TrackerSnapshot {
            status: self.status(),
            current: self.current.clone(),
            elapsed_secs: self.current.as_ref().map(|active| active.elapsed_secs(now)),
            history_len: self.history.len(),
            prediction_count: self.predictions.len(),
            confidence_threshold: self.config.confidence_threshold,
        }
    }

    /// Begin tracking `activity_name`. A running activity is stopped first under the
    /// usual rules; the record that stop produced, if any, is returned.
    pub fn start_activity<Tz: TimeZone>(
        &mut self,
        activity_name: &str,
        now: &DateTime<Tz>,
    ) -> Result<Option<ActivityRecord>> {
        let next = ActiveActivity::begin(activity_name, now)?;

        let finished = if self.current.is_some() {
            self.stop_activity(now)?
        } else {
            None
        };

        self.store
            .save_active(Some(&next))
            .context("failed to persist in-progress activity")?;
        info!("Started activity '{}'", next.activity_name);
        self.current = Some(next);

        Ok(finished)
    }

    /// Stop the current activity. Idle is a no-op. Activities shorter than
    /// `config.min_duration_secs` are dropped without a record.
    ///
    /// On error the recorder is unchanged: the activity is still running and the
    /// stored history is whatever it was before the call.
    pub fn stop_activity<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
    ) -> Result<Option<ActivityRecord>> {
        let record = match &self.current {
            Some(active) => active.finish(now)?,
            None => return Ok(None),
        };

        if record.duration_secs() < self.config.min_duration_secs {
            self.store
                .save_active(None)
                .context("failed to clear in-progress activity")?;
            self.current = None;
            info!(
                "Discarded '{}' after {:.1}s (minimum {}s)",
                record.activity_name(),
                record.duration_secs(),
                self.config.min_duration_secs
            );
            return Ok(None);
        }

        let mut history = self.history.clone();
        let evicted = history.push(record.clone());
        self.store
            .save(history.records())
            .context("failed to persist activity history")?;

        self.history = history;
        self.current = None;
        if let Some(evicted) = evicted {
            debug!(
                "History full; evicted '{}' from {}",
                evicted.activity_name(),
                evicted.start_time()
            );
        }

        // A leftover in-progress row is discarded on the next open
        if let Err(e) = self.store.save_active(None) {
            warn!("Failed to clear in-progress activity: {:#}", e);
        }

        info!(
            "Completed '{}' ({})",
            record.activity_name(),
            format_duration(record.duration_secs())
        );

        self.refresh_predictions(now);
        Ok(Some(record))
    }

    /// Recompute predictions from the current history.
    pub fn refresh_predictions<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> &[Prediction] {
        self.predictions = generate_predictions(self.history.records(), now, &self.config);
        &self.predictions
    }

    pub fn today_schedule<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<Prediction> {
        build_today_schedule(&self.predictions, now)
    }

    /// Change the acceptance threshold and recompute. Weighting of history is untouched.
    pub fn set_confidence_threshold<Tz: TimeZone>(
        &mut self,
        threshold: f64,
        now: &DateTime<Tz>,
    ) -> Result<()> {
        self.config.set_threshold(threshold)?;
        self.refresh_predictions(now);
        Ok(())
    }

    /// Drop all history, the current activity and predictions, in memory and in the store.
    pub fn clear(&mut self) -> Result<()> {
        self.history.clear();
        self.current = None;
        self.predictions.clear();
        self.store
            .save(&[])
            .context("failed to clear activity history")?;
        self.store
            .save_active(None)
            .context("failed to clear in-progress activity")?;
        info!("Cleared activity history");
        Ok(())
    }
}
