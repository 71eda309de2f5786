//! Configuration loading for nanglobus.
//!
//! The config file is an INI file in the shape the tool has always used:
//! a `[login]` section for the OAuth client and token cache, and a
//! `[globus]` section naming the endpoints, folders, label and poll time.
//! Keys contain spaces (`client id`, `poll time seconds`), and the poll
//! time may carry a trailing `#` comment that is stripped before parsing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use configparser::ini::Ini;
use thiserror::Error;

/// Configuration load/parse errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("missing config key `{key}` in section [{section}]")]
    Missing {
        section: &'static str,
        key: &'static str,
    },

    #[error("invalid value for `{section}.{key}`: {message}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        message: String,
    },
}

/// Immutable process configuration, loaded once and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub login: LoginConfig,
    pub globus: GlobusConfig,
}

/// The `[login]` section.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Native-app OAuth client id registered with Globus Auth.
    pub client_id: String,
    /// File caching the transfer-API refresh token between runs.
    pub refresh_token_file: PathBuf,
    /// Whether to launch the system browser during interactive login.
    pub browser: bool,
}

/// The `[globus]` section.
#[derive(Debug, Clone)]
pub struct GlobusConfig {
    pub source_endpoint: String,
    pub dest_endpoint: String,
    pub source_folder: String,
    pub dest_folder: String,
    pub transfer_label: String,
    /// Bound for the task wait and the inter-iteration sleep.
    pub poll_time: Duration,
}

impl Config {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut ini = Ini::new();
        ini.load(path).map_err(|message| ConfigError::Load {
            path: path.to_path_buf(),
            message,
        })?;

        let get = |section: &'static str, key: &'static str| -> Result<String, ConfigError> {
            ini.get(section, key)
                .ok_or(ConfigError::Missing { section, key })
        };

        // getboolcoerce accepts the yes/no spellings Python's getboolean did.
        let browser = ini
            .getboolcoerce("login", "browser")
            .map_err(|message| ConfigError::Invalid {
                section: "login",
                key: "browser",
                message,
            })?
            .ok_or(ConfigError::Missing {
                section: "login",
                key: "browser",
            })?;

        let poll_raw = get("globus", "poll time seconds")?;
        let poll_time = parse_poll_time(&poll_raw).map_err(|message| ConfigError::Invalid {
            section: "globus",
            key: "poll time seconds",
            message,
        })?;

        Ok(Self {
            login: LoginConfig {
                client_id: get("login", "client id")?,
                refresh_token_file: PathBuf::from(get("login", "refresh token file")?),
                browser,
            },
            globus: GlobusConfig {
                source_endpoint: get("globus", "source endpoint")?,
                dest_endpoint: get("globus", "dest endpoint")?,
                source_folder: get("globus", "source folder")?,
                dest_folder: get("globus", "dest folder")?,
                transfer_label: get("globus", "transfer label")?,
                poll_time,
            },
        })
    }
}

/// Strip a trailing `#` comment and parse the remainder as whole seconds.
fn parse_poll_time(raw: &str) -> Result<Duration, String> {
    let value = raw.split('#').next().unwrap_or("").trim();
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| format!("`{raw}` is not a whole number of seconds: {e}"))
}
