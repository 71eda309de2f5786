//! Command-line argument parsing for nanglobus.
//!
//! This module handles parsing command-line arguments into the options the
//! binary runs with. There are no subcommands; the only flags select the
//! config file and the log verbosity.

use std::path::PathBuf;

/// Config file used when `-c/--config` is not given.
pub const DEFAULT_CONFIG: &str = "nanglobus.cfg";

/// Log level used when `-l/--loglevel` is not given.
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Parsed CLI action to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    /// Show usage and exit
    ShowHelp,
    /// Show version information and exit
    ShowVersion,
    /// Run the transfer loop with the given options (default)
    Run(CliArgs),
}

/// Options for a normal run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Path to the configuration file.
    pub config: PathBuf,
    /// Log level name handed to the tracing subscriber.
    pub log_level: String,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Parse command-line arguments and return the appropriate action.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Returns
///
/// The `CliAction` to execute, or a message describing the bad argument.
pub fn parse_args<I>(args: I) -> Result<CliAction, String>
where
    I: Iterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.skip(1); // Skip the program name

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::ShowHelp),
            "-V" | "--version" => return Ok(CliAction::ShowVersion),
            "-c" | "--config" => {
                let value = args.next().ok_or_else(|| format!("{arg} requires a value"))?;
                parsed.config = PathBuf::from(value);
            }
            "-l" | "--loglevel" => {
                parsed.log_level = args.next().ok_or_else(|| format!("{arg} requires a value"))?;
            }
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    Ok(CliAction::Run(parsed))
}

/// Usage text printed for `--help` and for argument errors.
pub fn usage() -> String {
    format!(
        "Usage: nanglobus [-c CONFIG] [-l LEVEL]\n\n\
         \x20 -c, --config <path>    Config file to use. Default: {DEFAULT_CONFIG}\n\
         \x20 -l, --loglevel <name>  Log level. Default: {DEFAULT_LOG_LEVEL}\n\
         \x20 -h, --help             Show this help\n\
         \x20 -V, --version          Show version information"
    )
}
