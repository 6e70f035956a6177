use serde::{Deserialize, Serialize};

use crate::content::SnapshotLimits;

/// Tunables of one bridge instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgePolicy {
    /// Identity fragments marking a participant as the voice agent
    pub agent_markers: Vec<String>,
    /// Data-message topics carrying commands; an untopiced message is always accepted
    pub inbound_topics: Vec<String>,
    pub result_topic: String,
    pub content_topic: String,
    pub poll_interval_ms: u64,
    /// Window in which equal commands from any channel are coalesced
    pub dedup_window_ms: u64,
    /// Action ids remembered per session for exactly-once execution
    pub action_id_capacity: usize,
    pub settle_delay_ms: u64,
    pub indicator_lead_ms: u64,
    pub indicator_hold_ms: u64,
    pub snapshot: SnapshotLimits,
    pub report_button_phrase: String,
    /// Treat loopback hosts as same-origin (local development)
    pub allow_loopback: bool,
    pub inbound_buffer: usize,
}

impl Default for BridgePolicy {
    fn default() -> Self {
        Self {
            agent_markers: vec!["agent".to_string()],
            inbound_topics: vec!["agent-navigation".to_string(), "dom-action".to_string()],
            result_topic: "dom-action-result".to_string(),
            content_topic: "page-content".to_string(),
            poll_interval_ms: 500,
            dedup_window_ms: 1500,
            action_id_capacity: 256,
            settle_delay_ms: 1500,
            indicator_lead_ms: 120,
            indicator_hold_ms: 600,
            snapshot: SnapshotLimits::default(),
            report_button_phrase: "View Report".to_string(),
            allow_loopback: true,
            inbound_buffer: 64,
        }
    }
}

impl BridgePolicy {
    /// Whether data published on `topic` may carry commands.
    pub fn accepts_topic(&self, topic: Option<&str>) -> bool {
        match topic {
            None => true,
            Some(topic) => self.inbound_topics.iter().any(|t| t == topic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let policy: BridgePolicy =
            serde_json::from_str(r#"{"poll_interval_ms": 250, "agent_markers": ["bot"]}"#).unwrap();
        assert_eq!(policy.poll_interval_ms, 250);
        assert_eq!(policy.agent_markers, vec!["bot"]);
        assert_eq!(policy.dedup_window_ms, 1500);
        assert_eq!(policy.snapshot.list_cap, 50);
    }

    #[test]
    fn topic_filter() {
        let policy = BridgePolicy::default();
        assert!(policy.accepts_topic(None));
        assert!(policy.accepts_topic(Some("dom-action")));
        assert!(!policy.accepts_topic(Some("page-content")));
    }
}
