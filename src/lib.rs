//! VoiceNav library
//!
//! Configuration and offline fixtures shared by the `voicenav` binary and
//! its integration tests.

pub mod config;
pub mod fixtures;

pub use config::{Config, ConfigError};
pub use fixtures::{parse_events, run_replay, ReplayEvent, ReplayReport, SiteFixture};
