pub mod analyzer;
pub mod config;
pub mod predictor;
pub mod schedule;
pub mod types;

pub use config::{threshold_from_sensitivity, PredictionConfig};
pub use predictor::generate_predictions;
pub use schedule::build_today_schedule;
pub use types::{ActivityPattern, DurationStats, Prediction};
