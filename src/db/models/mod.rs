pub mod activity;
pub mod routine;

pub use activity::{ActiveActivity, ActivityRecord};
pub use routine::{Routine, RoutineInput, TimeOfDay};
