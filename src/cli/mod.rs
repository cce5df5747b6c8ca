pub mod args;
pub mod commands;

pub use args::{Cli, Commands, SourceArgs};
pub use commands::{execute, run, Mode, RunConfig, RunSummary};
