//! Offline fixtures: a site (pages per route) and a scripted session
//!
//! Sites are YAML:
//!
//! ```yaml
//! app_host: app.example.com
//! start_path: /
//! pages:
//!   /:
//!     title: Home
//!     body: { tag: main, children: [ { tag: button, text: View Report } ] }
//! ```
//!
//! Session scripts are JSON lines, one transport event per line:
//!
//! ```text
//! {"event":"connect"}
//! {"event":"data","topic":"dom-action","participant":"agent","payload":{"type":"dom-action", ...}}
//! {"event":"wait","ms":500}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use page_dom::{Document, PageSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use voice_bridge::memory::{MemoryApp, MemoryTransport};
use voice_bridge::{ConnectionState, Notice, OutboundMessage, VoiceBridge};

use crate::config::Config;

const STEP: Duration = Duration::from_millis(10);
const MAX_SETTLE_STEPS: usize = 500;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("invalid site fixture: {0}")]
    Site(#[from] serde_yaml::Error),
    #[error("invalid event on line {line}: {source}")]
    Event {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_start() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteFixture {
    #[serde(default = "default_host")]
    pub app_host: String,
    #[serde(default = "default_start")]
    pub start_path: String,
    #[serde(default)]
    pub pages: BTreeMap<String, PageSpec>,
}

impl SiteFixture {
    pub fn from_yaml(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// In-memory app showing `start_path`; unknown routes keep the current page.
    pub fn build_app(&self) -> Arc<MemoryApp> {
        let pages: HashMap<String, Document> = self
            .pages
            .iter()
            .map(|(path, spec)| (path.clone(), spec.to_document()))
            .collect();
        let start = pages
            .get(&self.start_path)
            .cloned()
            .unwrap_or_else(|| Document::new(""));
        MemoryApp::with_pages(&self.app_host, &self.start_path, start, pages)
    }
}

/// One scripted transport event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Connect,
    Disconnect,
    Data {
        #[serde(default)]
        topic: Option<String>,
        #[serde(default)]
        participant: Option<String>,
        payload: Value,
    },
    Raw {
        #[serde(default)]
        participant: Option<String>,
        payload: Value,
    },
    Metadata {
        participant: String,
        value: String,
        #[serde(default = "announce_by_default")]
        announce: bool,
    },
    Transcript {
        participant: String,
        text: String,
    },
    Wait {
        ms: u64,
    },
}

fn announce_by_default() -> bool {
    true
}

/// Parse a JSON-lines script; blank lines and `#` comments are skipped.
pub fn parse_events(raw: &str) -> Result<Vec<ReplayEvent>, FixtureError> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| FixtureError::Event {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Strings are sent verbatim, anything else as its JSON text.
fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub messages: Vec<OutboundMessage>,
    pub notices: Vec<Notice>,
    pub history: Vec<String>,
    pub final_path: String,
}

/// Drive a full bridge session over the in-memory transport.
pub async fn run_replay(site: &SiteFixture, events: &[ReplayEvent], config: &Config) -> ReplayReport {
    let transport = MemoryTransport::new();
    let app = site.build_app();
    let bridge = VoiceBridge::new(
        app.ports(transport.clone()),
        config.bridge.clone(),
        config.routes.clone(),
    );
    let shutdown = CancellationToken::new();
    let handle = bridge.spawn(shutdown.clone());

    for event in events {
        debug!(?event, "replaying");
        match event {
            ReplayEvent::Connect => {
                transport.connect();
                settle(|| bridge.state() == ConnectionState::Connected).await;
            }
            ReplayEvent::Disconnect => {
                transport.disconnect();
                settle(|| bridge.state() == ConnectionState::Disconnected).await;
            }
            ReplayEvent::Data {
                topic,
                participant,
                payload,
            } => transport.send_data(
                topic.as_deref(),
                participant.as_deref(),
                &payload_text(payload),
            ),
            ReplayEvent::Raw {
                participant,
                payload,
            } => transport.send_raw(participant.as_deref(), payload_text(payload).as_bytes()),
            ReplayEvent::Metadata {
                participant,
                value,
                announce,
            } => transport.set_metadata(participant, value, *announce),
            ReplayEvent::Transcript { participant, text } => transport.transcribe(participant, text),
            ReplayEvent::Wait { ms } => sleep(Duration::from_millis(*ms)).await,
        }
        sleep(STEP).await;
    }

    // let pending navigations and the settle report land
    let policy = &config.bridge;
    let tail = policy
        .settle_delay_ms
        .max(policy.indicator_lead_ms + policy.indicator_hold_ms);
    sleep(Duration::from_millis(tail) + STEP).await;

    shutdown.cancel();
    if let Err(err) = handle.await {
        tracing::warn!(error = %err, "bridge task ended abnormally");
    }
    info!(
        messages = transport.published().len(),
        live_tasks = bridge.live_tasks(),
        "replay finished"
    );

    ReplayReport {
        messages: transport.messages(),
        notices: app.notices(),
        history: app.history(),
        final_path: app.current_path(),
    }
}

async fn settle(condition: impl Fn() -> bool) {
    for _ in 0..MAX_SETTLE_STEPS {
        if condition() {
            return;
        }
        sleep(STEP).await;
    }
    debug!("state did not settle");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_parse_with_line_numbers() {
        let script = "# session\n{\"event\":\"connect\"}\n\n{\"event\":\"wait\",\"ms\":20}\n{\"event\":\"bogus\"}\n";
        let err = parse_events(script).unwrap_err();
        assert!(matches!(err, FixtureError::Event { line: 5, .. }));

        let events = parse_events("{\"event\":\"metadata\",\"participant\":\"agent\",\"value\":\"x\"}").unwrap();
        assert_eq!(
            events,
            vec![ReplayEvent::Metadata {
                participant: "agent".into(),
                value: "x".into(),
                announce: true
            }]
        );
    }

    #[test]
    fn object_payloads_are_sent_as_json() {
        assert_eq!(payload_text(&Value::String("raw".into())), "raw");
        assert_eq!(payload_text(&serde_json::json!({"a": 1})), r#"{"a":1}"#);
    }
}
