pub mod constants;
pub mod departments;
pub mod format;
pub mod progress;

pub use constants::*;
pub use departments::{department_name, is_mainland};
pub use format::{as_dd, format_elapsed, format_nice, format_timestamp};
pub use progress::ProgressReporter;
