pub mod format;
pub mod logging;

pub use format::format_duration;
pub use logging::init_logging;
