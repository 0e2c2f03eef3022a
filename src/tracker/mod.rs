mod controller;
mod events;
mod history;
mod recorder;
mod reminders;
mod state;
pub mod store;
mod suggestions;

pub use controller::{TrackerConfig, TrackerController};
pub use events::TrackerEvent;
pub use history::ActivityHistory;
pub use recorder::ActivityRecorder;
pub use reminders::{ReminderHandle, ReminderOutcome, ReminderScheduler, DEFAULT_REMINDER_LEAD_MINUTES};
pub use state::{TrackerSnapshot, TrackerStatus};
pub use store::{HistoryStore, MemoryStore};
pub use suggestions::{Suggestion, SuggestionChecker, PREDICTION_WINDOW_MINUTES, ROUTINE_WINDOW_MINUTES};
