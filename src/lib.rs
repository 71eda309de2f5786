//! nanglobus - push a directory between two Globus endpoints, forever.
//!
//! The crate is a thin orchestration shell around the hosted Globus
//! services: it logs in once (caching a refresh token on disk), then
//! submits one recursive checksum-synced transfer per iteration and waits
//! for the service to report the task done before sleeping and going again.

pub mod auth;
pub mod cli;
pub mod config;
pub mod transfer;
