use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};

use crate::{
    db::{ActivityRecord, Database},
    export::{default_file_name, ExportBundle},
    prediction::{Prediction, PredictionConfig},
    settings::SettingsStore,
};

use super::{
    events::TrackerEvent,
    recorder::ActivityRecorder,
    reminders::{ReminderOutcome, ReminderScheduler, DEFAULT_REMINDER_LEAD_MINUTES},
    state::TrackerSnapshot,
    store::HistoryStore,
    suggestions::{Suggestion, SuggestionChecker},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often the ticker refreshes predictions and checks for suggestions
    pub check_interval: Duration,
    /// How far ahead of an activity reminders fire
    pub reminder_lead: chrono::Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            reminder_lead: chrono::Duration::minutes(DEFAULT_REMINDER_LEAD_MINUTES),
        }
    }
}

impl TrackerConfig {
    /// Defaults, with a one second check interval when `TIMEWISE_DEBUG` is set.
    pub fn from_env() -> Self {
        let debug_mode = std::env::var("TIMEWISE_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let mut config = Self::default();
        if debug_mode {
            config.check_interval = Duration::from_secs(1);
        }
        config
    }
}

/// Async front end over the recorder: persistence, settings, suggestions, reminders
/// and the periodic ticker. Clones share all state.
#[derive(Clone)]
pub struct TrackerController {
    recorder: Arc<StdMutex<ActivityRecorder>>,
    db: Database,
    settings: Arc<SettingsStore>,
    events: broadcast::Sender<TrackerEvent>,
    reminders: Arc<ReminderScheduler>,
    suggestions: Arc<Mutex<SuggestionChecker>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    config: TrackerConfig,
}

impl TrackerController {
    pub async fn new<Tz>(
        db: Database,
        settings: Arc<SettingsStore>,
        config: TrackerConfig,
        now: DateTime<Tz>,
    ) -> Result<Self>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let threshold = settings.confidence_threshold()?;
        let prediction_config = PredictionConfig::default().with_threshold(threshold)?;

        let store: Arc<dyn HistoryStore> = Arc::new(db.clone());
        let recorder = tokio::task::spawn_blocking(move || {
            ActivityRecorder::open(store, prediction_config, &now)
        })
        .await
        .context("activity recorder setup panicked")??;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let reminders = ReminderScheduler::new(config.reminder_lead, events.clone());

        Ok(Self {
            recorder: Arc::new(StdMutex::new(recorder)),
            db,
            settings,
            events,
            reminders: Arc::new(reminders),
            suggestions: Arc::new(Mutex::new(SuggestionChecker::new())),
            ticker: Arc::new(Mutex::new(None)),
            config,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub async fn snapshot<Tz>(&self, now: DateTime<Tz>) -> Result<TrackerSnapshot>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        self.with_recorder(move |recorder| Ok(recorder.snapshot(&now)))
            .await
    }

    pub async fn start_activity<Tz>(&self, activity_name: &str, now: DateTime<Tz>) -> Result<TrackerSnapshot>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let activity_name = activity_name.to_string();
        let (finished, snapshot, predictions) = self
            .with_recorder(move |recorder| {
                let finished = recorder.start_activity(&activity_name, &now)?;
                Ok((finished, recorder.snapshot(&now), recorder.predictions().to_vec()))
            })
            .await?;

        if let Some(record) = finished {
            self.emit_recorded(record, predictions);
        }
        self.emit(TrackerEvent::StateChanged {
            snapshot: snapshot.clone(),
        });

        Ok(snapshot)
    }

    /// Stop the running activity; `None` when idle or when it was too short to keep.
    pub async fn stop_activity<Tz>(&self, now: DateTime<Tz>) -> Result<Option<ActivityRecord>>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let (finished, snapshot, predictions) = self
            .with_recorder(move |recorder| {
                let finished = recorder.stop_activity(&now)?;
                Ok((finished, recorder.snapshot(&now), recorder.predictions().to_vec()))
            })
            .await?;

        if let Some(record) = &finished {
            self.emit_recorded(record.clone(), predictions);
        }
        self.emit(TrackerEvent::StateChanged { snapshot });

        Ok(finished)
    }

    pub async fn predictions(&self) -> Result<Vec<Prediction>> {
        self.with_recorder(|recorder| Ok(recorder.predictions().to_vec()))
            .await
    }

    pub async fn today_schedule<Tz>(&self, now: DateTime<Tz>) -> Result<Vec<Prediction>>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        self.with_recorder(move |recorder| Ok(recorder.today_schedule(&now)))
            .await
    }

    pub async fn history(&self) -> Result<Vec<ActivityRecord>> {
        self.with_recorder(|recorder| Ok(recorder.history().to_vec()))
            .await
    }

    /// Persist a new sensitivity, re-threshold predictions and return the new threshold.
    pub async fn set_sensitivity<Tz>(&self, sensitivity: u8, now: DateTime<Tz>) -> Result<f64>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let threshold = self.settings.update_sensitivity(sensitivity)?;
        let predictions = self
            .with_recorder(move |recorder| {
                recorder.set_confidence_threshold(threshold, &now)?;
                Ok(recorder.predictions().to_vec())
            })
            .await?;

        self.emit(TrackerEvent::PredictionsUpdated { predictions });
        Ok(threshold)
    }

    pub async fn set_tracking_enabled(&self, enabled: bool) -> Result<()> {
        self.settings.update_tracking_enabled(enabled)?;
        if enabled {
            self.start_ticker().await;
        } else {
            self.stop_ticker().await;
        }
        Ok(())
    }

    pub async fn set_reminder_notifications(&self, enabled: bool) -> Result<()> {
        self.settings.update_reminder_notifications(enabled)
    }

    /// Remind the user ahead of `activity_time`. Past times are rejected.
    pub fn set_reminder<Tz: TimeZone>(
        &self,
        activity: &str,
        activity_time: DateTime<Utc>,
        now: &DateTime<Tz>,
    ) -> Result<ReminderOutcome> {
        Ok(self.reminders.schedule(activity, activity_time, now)?)
    }

    pub fn cancel_reminders(&self) {
        self.reminders.cancel_all();
    }

    /// Emit and return any routine or prediction suggestions due at `now`.
    pub async fn check_suggestions<Tz>(&self, now: DateTime<Tz>) -> Result<Vec<Suggestion>>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        if !self.settings.reminder_notifications()? {
            return Ok(Vec::new());
        }

        let routines = self.db.list_routines().await?;
        let (predictions, threshold) = self
            .with_recorder(|recorder| {
                Ok((
                    recorder.predictions().to_vec(),
                    recorder.config().confidence_threshold,
                ))
            })
            .await?;

        let due = self
            .suggestions
            .lock()
            .await
            .check(&now, &routines, &predictions, threshold);

        for suggestion in &due {
            log_info!("Suggesting {:?}", suggestion);
            self.emit(TrackerEvent::Suggestion {
                suggestion: suggestion.clone(),
            });
        }

        Ok(due)
    }

    /// One ticker step: refresh predictions, then check for suggestions.
    pub async fn run_tick<Tz>(&self, now: DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let tick_now = now.clone();
        let refreshed = self
            .with_recorder(move |recorder| {
                let before = recorder.predictions().to_vec();
                let after = recorder.refresh_predictions(&tick_now).to_vec();
                Ok((before != after).then_some(after))
            })
            .await?;

        if let Some(predictions) = refreshed {
            self.emit(TrackerEvent::PredictionsUpdated { predictions });
        }

        self.check_suggestions(now).await?;
        Ok(())
    }

    /// Start the periodic ticker, replacing one that is already running.
    pub async fn start_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let check_interval = self.config.check_interval;

        let handle = tokio::spawn(async move {
            let mut interval =
                time::interval_at(time::Instant::now() + check_interval, check_interval);
            loop {
                interval.tick().await;
                if let Err(e) = controller.run_tick(Local::now()).await {
                    log_error!("Tracker tick failed: {}", e);
                }
            }
        });

        log_info!("Tracker ticker started ({:?} interval)", check_interval);
        *ticker_guard = Some(handle);
    }

    pub async fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
            log_info!("Tracker ticker stopped");
        }
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the ticker and cancel pending reminders. The running activity, if any,
    /// stays persisted.
    pub async fn shutdown(&self) {
        self.stop_ticker().await;
        self.reminders.cancel_all();
        log_info!("Tracker shut down");
    }

    /// Synchronous form of [`TrackerController::shutdown`] for `Drop` impls. The ticker
    /// task holds its own clone of the controller, so dropping handles alone never
    /// stops it.
    pub fn abort_background(&self) {
        match self.ticker.try_lock() {
            Ok(mut guard) => {
                if let Some(handle) = guard.take() {
                    handle.abort();
                }
            }
            Err(_) => log_error!("Ticker busy during abort; it stops with the runtime"),
        }
        self.reminders.cancel_all();
    }

    pub async fn export<Tz>(&self, now: DateTime<Tz>) -> Result<ExportBundle>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let (activities, predictions) = self
            .with_recorder(|recorder| {
                Ok((
                    recorder.history().to_vec(),
                    recorder.predictions().to_vec(),
                ))
            })
            .await?;
        let routines = self.db.list_routines().await?;

        Ok(ExportBundle::new(
            now.with_timezone(&Utc),
            activities,
            routines,
            predictions,
        ))
    }

    /// Write an export into `dir` under the default file name for `now`'s date.
    pub async fn export_to_dir<Tz>(&self, dir: &Path, now: DateTime<Tz>) -> Result<PathBuf>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let path = dir.join(default_file_name(now.date_naive()));
        let bundle = self.export(now).await?;
        bundle.write_to(&path)?;
        Ok(path)
    }

    /// Delete history, routines and the running activity.
    pub async fn clear_all_data<Tz>(&self, now: DateTime<Tz>) -> Result<()>
    where
        Tz: TimeZone + Send + 'static,
        Tz::Offset: Send,
    {
        let snapshot = self
            .with_recorder(move |recorder| {
                recorder.clear()?;
                Ok(recorder.snapshot(&now))
            })
            .await?;
        self.db.clear_routines().await?;
        self.suggestions.lock().await.reset();
        self.reminders.cancel_all();

        log_info!("Cleared all tracker data");
        self.emit(TrackerEvent::PredictionsUpdated {
            predictions: Vec::new(),
        });
        self.emit(TrackerEvent::StateChanged { snapshot });
        Ok(())
    }

    async fn with_recorder<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut ActivityRecorder) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let recorder = self.recorder.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = recorder
                .lock()
                .map_err(|_| anyhow!("activity recorder lock poisoned"))?;
            task(&mut *guard)
        })
        .await
        .context("activity recorder task panicked")?
    }

    fn emit_recorded(&self, record: ActivityRecord, predictions: Vec<Prediction>) {
        self.emit(TrackerEvent::ActivityRecorded { record });
        self.emit(TrackerEvent::PredictionsUpdated { predictions });
    }

    fn emit(&self, event: TrackerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
