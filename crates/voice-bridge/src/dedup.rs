//! Duplicate suppression across inbound channels

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use tokio::time::Instant;
use voicenav_core_types::{ActionId, ParticipantId};

/// Session-scoped duplicate filter.
///
/// Three layers:
/// - last metadata string per participant (shared by change events and polling)
/// - canonical command keys coalesced within a time window, across channels
/// - DOM action ids remembered for the session, bounded FIFO
#[derive(Debug)]
pub struct DedupGuard {
    window: Duration,
    id_capacity: usize,
    last_metadata: HashMap<ParticipantId, String>,
    recent: HashMap<String, Instant>,
    seen_ids: HashSet<ActionId>,
    id_order: VecDeque<ActionId>,
}

impl DedupGuard {
    pub fn new(window: Duration, id_capacity: usize) -> Self {
        Self {
            window,
            id_capacity: id_capacity.max(1),
            last_metadata: HashMap::new(),
            recent: HashMap::new(),
            seen_ids: HashSet::new(),
            id_order: VecDeque::new(),
        }
    }

    /// Record `metadata` for `participant`; false when it equals the last value seen.
    pub fn metadata_changed(&mut self, participant: &ParticipantId, metadata: &str) -> bool {
        match self.last_metadata.get(participant) {
            Some(previous) if previous == metadata => false,
            _ => {
                self.last_metadata
                    .insert(participant.clone(), metadata.to_string());
                true
            }
        }
    }

    /// Admit a command key unless an equal one was admitted within the window.
    pub fn admit_key(&mut self, key: &str, now: Instant) -> bool {
        let window = self.window;
        self.recent
            .retain(|_, seen| now.saturating_duration_since(*seen) < window);
        if self.recent.contains_key(key) {
            return false;
        }
        self.recent.insert(key.to_string(), now);
        true
    }

    /// Admit an action id the first time it is seen in this session.
    pub fn admit_action(&mut self, id: &ActionId) -> bool {
        if self.seen_ids.contains(id) {
            return false;
        }
        if self.id_order.len() >= self.id_capacity {
            if let Some(oldest) = self.id_order.pop_front() {
                self.seen_ids.remove(&oldest);
            }
        }
        self.seen_ids.insert(id.clone());
        self.id_order.push_back(id.clone());
        true
    }

    pub fn remembered_actions(&self) -> usize {
        self.seen_ids.len()
    }
}
