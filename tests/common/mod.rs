//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use nanglobus::config::{Config, GlobusConfig, LoginConfig};

pub const SOURCE_ENDPOINT: &str = "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa";
pub const DEST_ENDPOINT: &str = "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb";
pub const SOURCE_FOLDER: &str = "/data/out";
pub const DEST_FOLDER: &str = "/ingest/in";
pub const TRANSFER_LABEL: &str = "nightly push";

/// A config equivalent to a loaded nanglobus.cfg, with browser launch off.
pub fn test_config(refresh_token_file: &Path, poll_secs: u64) -> Config {
    Config {
        login: LoginConfig {
            client_id: "test-client".to_string(),
            refresh_token_file: refresh_token_file.to_path_buf(),
            browser: false,
        },
        globus: GlobusConfig {
            source_endpoint: SOURCE_ENDPOINT.to_string(),
            dest_endpoint: DEST_ENDPOINT.to_string(),
            source_folder: SOURCE_FOLDER.to_string(),
            dest_folder: DEST_FOLDER.to_string(),
            transfer_label: TRANSFER_LABEL.to_string(),
            poll_time: Duration::from_secs(poll_secs),
        },
    }
}
