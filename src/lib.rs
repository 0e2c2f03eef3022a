pub mod db;
pub mod error;
pub mod export;
pub mod prediction;
pub mod settings;
pub mod tracker;
pub mod utils;

use std::{path::Path, sync::Arc};

use chrono::Local;

pub use db::{ActiveActivity, ActivityRecord, Database, Routine, RoutineInput, TimeOfDay};
pub use error::InputError;
pub use prediction::{build_today_schedule, generate_predictions, Prediction, PredictionConfig};
pub use settings::{SettingsStore, UserSettings};
pub use tracker::{TrackerConfig, TrackerController, TrackerEvent};

pub const DATABASE_FILE_NAME: &str = "timewise.sqlite3";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Everything a host application needs, wired together by [`launch`].
///
/// Dropping it stops the ticker and cancels pending reminders; call
/// [`AppState::shutdown`] from async code to wait for the ticker lock.
pub struct AppState {
    pub db: Database,
    pub tracker: TrackerController,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    pub async fn shutdown(self) {
        self.tracker.shutdown().await;
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.tracker.abort_background();
    }
}

/// Open (or create) the data directory and start tracking.
///
/// Sets up logging, opens the database and settings, recovers from an unclean
/// shutdown and starts the ticker when tracking is enabled.
pub async fn launch(data_dir: &Path) -> anyhow::Result<AppState> {
    utils::init_logging();
    log::info!("Timewise starting up...");

    std::fs::create_dir_all(data_dir)?;

    let database = Database::new(data_dir.join(DATABASE_FILE_NAME))?;
    let settings = Arc::new(SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?);

    let tracker = TrackerController::new(
        database.clone(),
        settings.clone(),
        TrackerConfig::from_env(),
        Local::now(),
    )
    .await?;

    if settings.tracking_enabled()? {
        tracker.start_ticker().await;
    }

    Ok(AppState {
        db: database,
        tracker,
        settings,
    })
}
