//! In-process adapters for the bridge ports
//!
//! [`MemoryTransport`] is a voice session whose events are injected by the
//! caller and whose publications are recorded. [`MemoryApp`] is a host
//! application with a router, a page per route and a notice log.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use page_dom::Document;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::debug;
use voicenav_core_types::ParticipantId;
use voicenav_event_bus::{EventBus, InMemoryBus};

use crate::errors::BridgeError;
use crate::model::{ConnectionState, Notice, OutboundMessage, SessionEvent};
use crate::ports::{BridgePorts, NotifierPort, PagePort, RouterPort, SessionTransport};

const EVENT_CAPACITY: usize = 256;

/// One publication recorded by [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub reliable: bool,
}

impl Published {
    pub fn message(&self) -> Option<OutboundMessage> {
        serde_json::from_slice(&self.payload).ok()
    }
}

pub struct MemoryTransport {
    events: Arc<InMemoryBus<SessionEvent>>,
    state: RwLock<ConnectionState>,
    metadata: RwLock<BTreeMap<ParticipantId, String>>,
    published: Mutex<Vec<Published>>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: InMemoryBus::new(EVENT_CAPACITY),
            state: RwLock::new(ConnectionState::Disconnected),
            metadata: RwLock::new(BTreeMap::new()),
            published: Mutex::new(Vec::new()),
        })
    }

    pub fn set_connection(&self, state: ConnectionState) {
        *self.state.write() = state;
        self.emit(SessionEvent::Connection(state));
    }

    pub fn connect(&self) {
        self.set_connection(ConnectionState::Connecting);
        self.set_connection(ConnectionState::Connected);
    }

    pub fn disconnect(&self) {
        self.set_connection(ConnectionState::Disconnected);
    }

    pub fn emit(&self, event: SessionEvent) {
        self.events.emit(event);
    }

    pub fn send_data(&self, topic: Option<&str>, participant: Option<&str>, payload: &str) {
        self.emit(SessionEvent::Data {
            topic: topic.map(str::to_string),
            payload: payload.as_bytes().to_vec(),
            participant: participant.map(ParticipantId::new),
        });
    }

    pub fn send_raw(&self, participant: Option<&str>, payload: &[u8]) {
        self.emit(SessionEvent::RawData {
            payload: payload.to_vec(),
            participant: participant.map(ParticipantId::new),
        });
    }

    pub fn transcribe(&self, participant: &str, text: &str) {
        self.emit(SessionEvent::Transcription {
            participant: Some(ParticipantId::new(participant)),
            text: text.to_string(),
        });
    }

    /// Store participant metadata, optionally announcing the change.
    pub fn set_metadata(&self, participant: &str, metadata: &str, announce: bool) {
        let participant = ParticipantId::new(participant);
        self.metadata
            .write()
            .insert(participant.clone(), metadata.to_string());
        if announce {
            self.emit(SessionEvent::MetadataChanged {
                participant,
                metadata: metadata.to_string(),
            });
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    /// Decoded publications, in order.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.published
            .lock()
            .iter()
            .filter_map(Published::message)
            .collect()
    }

    pub fn clear_published(&self) {
        self.published.lock().clear();
    }
}

#[async_trait]
impl SessionTransport for MemoryTransport {
    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        reliable: bool,
    ) -> Result<(), BridgeError> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(BridgeError::Transport("session not connected".to_string()));
        }
        debug!(topic, bytes = payload.len(), "publishing");
        self.published.lock().push(Published {
            topic: topic.to_string(),
            payload,
            reliable,
        });
        Ok(())
    }

    async fn participant_metadata(&self) -> Result<Vec<(ParticipantId, String)>, BridgeError> {
        Ok(self
            .metadata
            .read()
            .iter()
            .map(|(participant, metadata)| (participant.clone(), metadata.clone()))
            .collect())
    }
}

/// Host application: router, one page per known route, notices and the
/// navigating indicator.
pub struct MemoryApp {
    host: String,
    path: RwLock<String>,
    document: Arc<RwLock<Document>>,
    pages: HashMap<String, Document>,
    changes: broadcast::Sender<String>,
    history: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
    indicator: Mutex<Vec<bool>>,
}

impl MemoryApp {
    pub fn new(host: &str, path: &str, document: Document) -> Arc<Self> {
        Self::with_pages(host, path, document, HashMap::new())
    }

    /// App whose router swaps in `pages[path]` on every route change.
    pub fn with_pages(
        host: &str,
        path: &str,
        document: Document,
        pages: HashMap<String, Document>,
    ) -> Arc<Self> {
        let (changes, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            host: host.to_string(),
            path: RwLock::new(path.to_string()),
            document: Arc::new(RwLock::new(document)),
            pages,
            changes,
            history: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
            indicator: Mutex::new(Vec::new()),
        })
    }

    pub fn ports(self: &Arc<Self>, transport: Arc<MemoryTransport>) -> BridgePorts {
        BridgePorts {
            transport,
            router: self.clone(),
            page: self.clone(),
            notifier: self.clone(),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Every indicator transition, in order.
    pub fn indicator_log(&self) -> Vec<bool> {
        self.indicator.lock().clone()
    }

    pub fn is_navigating(&self) -> bool {
        self.indicator.lock().last().copied().unwrap_or(false)
    }

    /// Current path, without going through the router port.
    pub fn current_path(&self) -> String {
        self.path.read().clone()
    }

    pub fn document_handle(&self) -> Arc<RwLock<Document>> {
        Arc::clone(&self.document)
    }
}

#[async_trait]
impl RouterPort for MemoryApp {
    fn app_host(&self) -> String {
        self.host.clone()
    }

    fn current_path(&self) -> String {
        self.path.read().clone()
    }

    async fn push(&self, path: &str) -> Result<(), BridgeError> {
        let route = path.split(['?', '#']).next().unwrap_or(path);
        if let Some(page) = self.pages.get(route) {
            *self.document.write() = page.clone();
        }
        *self.path.write() = path.to_string();
        self.history.lock().push(path.to_string());
        let _ = self.changes.send(path.to_string());
        Ok(())
    }

    fn route_changes(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}

impl PagePort for MemoryApp {
    fn document(&self) -> Arc<RwLock<Document>> {
        self.document_handle()
    }
}

impl NotifierPort for MemoryApp {
    fn notify(&self, notice: Notice) {
        debug!(level = ?notice.level, message = %notice.message, "notice");
        self.notices.lock().push(notice);
    }

    fn set_navigating(&self, active: bool) {
        self.indicator.lock().push(active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_publishes_only_while_connected() {
        let transport = MemoryTransport::new();
        assert!(transport.publish("t", vec![1], true).await.is_err());
        transport.connect();
        transport.publish("t", vec![1], true).await.unwrap();
        assert_eq!(transport.published().len(), 1);
    }

    #[tokio::test]
    async fn router_swaps_known_pages() {
        let mut pages = HashMap::new();
        pages.insert("/bots".to_string(), Document::new("Bots"));
        let app = MemoryApp::with_pages("app.example.com", "/", Document::new("Home"), pages);
        let mut changes = app.route_changes();

        app.push("/bots?x=1").await.unwrap();
        assert_eq!(app.document().read().title(), "Bots");
        assert_eq!(changes.recv().await.unwrap(), "/bots?x=1");

        app.push("/elsewhere").await.unwrap();
        assert_eq!(app.document().read().title(), "Bots");
        assert_eq!(app.history(), vec!["/bots?x=1", "/elsewhere"]);
    }
}
