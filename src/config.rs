//! Configuration of the voicenav binary
//!
//! A YAML file with two sections: `bridge` (every [`BridgePolicy`] tunable)
//! and `routes` (path → label table used in navigation notices). Missing
//! keys keep their defaults; a few environment variables override the file.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use voice_bridge::{BridgePolicy, RouteTable};

pub const ENV_POLL_INTERVAL: &str = "VOICENAV_POLL_INTERVAL_MS";
pub const ENV_AGENT_MARKER: &str = "VOICENAV_AGENT_MARKER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bridge: BridgePolicy,
    pub routes: RouteTable,
}

impl Config {
    pub fn from_yaml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path`, or fall back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw, path)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply `VOICENAV_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_POLL_INTERVAL) {
            self.bridge.poll_interval_ms =
                raw.trim().parse().map_err(|err| ConfigError::Invalid {
                    key: ENV_POLL_INTERVAL.to_string(),
                    reason: format!("{err}"),
                })?;
            info!(poll_interval_ms = self.bridge.poll_interval_ms, "poll interval overridden");
        }
        if let Some(marker) = lookup(ENV_AGENT_MARKER) {
            let markers: Vec<String> = marker
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !markers.is_empty() {
                info!(?markers, "agent markers overridden");
                self.bridge.agent_markers = markers;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bridge = &self.bridge;
        let positive = [
            ("bridge.poll_interval_ms", bridge.poll_interval_ms),
            ("bridge.dedup_window_ms", bridge.dedup_window_ms),
            ("bridge.action_id_capacity", bridge.action_id_capacity as u64),
            ("bridge.inbound_buffer", bridge.inbound_buffer as u64),
            ("bridge.snapshot.list_cap", bridge.snapshot.list_cap as u64),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }
        if bridge.agent_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(invalid("bridge.agent_markers", "needs at least one marker"));
        }
        if bridge.inbound_topics.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("bridge.inbound_topics", "topics cannot be empty"));
        }
        for (key, topic) in [
            ("bridge.result_topic", &bridge.result_topic),
            ("bridge.content_topic", &bridge.content_topic),
        ] {
            if topic.trim().is_empty() {
                return Err(invalid(key, "cannot be empty"));
            }
        }
        if bridge.report_button_phrase.trim().is_empty() {
            return Err(invalid("bridge.report_button_phrase", "cannot be empty"));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Default lookup order: `./config/voicenav.yaml`, then the per-user config dir.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from("config/voicenav.yaml");
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("voicenav");
            path.push("config.yaml");
            path
        }
        None => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let raw = "bridge:\n  poll_interval_ms: 250\nroutes:\n  /fleet: Fleet\n";
        let config = Config::from_yaml(raw, Path::new("inline.yaml")).unwrap();
        assert_eq!(config.bridge.poll_interval_ms, 250);
        assert_eq!(config.bridge.dedup_window_ms, 1500);
        assert_eq!(config.routes.label_for("/fleet"), "Fleet");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_take_precedence() {
        let vars: HashMap<&str, &str> = [
            (ENV_POLL_INTERVAL, "100"),
            (ENV_AGENT_MARKER, "bot, assistant"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bridge.poll_interval_ms, 100);
        assert_eq!(config.bridge.agent_markers, vec!["bot", "assistant"]);
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == ENV_POLL_INTERVAL).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let mut config = Config::default();
        config.bridge.poll_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bridge.poll_interval_ms"));
    }
}
