use std::env;
use std::io::Write;

use serial_test::serial;
use voicenav_cli::config::{ENV_AGENT_MARKER, ENV_POLL_INTERVAL};
use voicenav_cli::Config;

fn clear_env() {
    env::remove_var(ENV_POLL_INTERVAL);
    env::remove_var(ENV_AGENT_MARKER);
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "bridge:\n  poll_interval_ms: 900\n  agent_markers: [agent]").unwrap();

    env::set_var(ENV_POLL_INTERVAL, "250");
    env::set_var(ENV_AGENT_MARKER, "assistant");
    let mut config = Config::load(file.path()).unwrap();
    config.apply_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.bridge.poll_interval_ms, 250);
    assert_eq!(config.bridge.agent_markers, vec!["assistant"]);
    config.validate().unwrap();
}

#[test]
#[serial]
fn missing_file_means_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "bridge: [not, a, map]").unwrap();
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("failed to parse"));
}
