//! Command-line interface for nanglobus.

pub mod args;

pub use args::{parse_args, usage, CliAction, CliArgs, DEFAULT_CONFIG, DEFAULT_LOG_LEVEL};
