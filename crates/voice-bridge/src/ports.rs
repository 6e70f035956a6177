use std::sync::Arc;

use async_trait::async_trait;
use page_dom::Document;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use voicenav_core_types::ParticipantId;

use crate::errors::BridgeError;
use crate::model::{ConnectionState, Notice, SessionEvent};

/// Remote voice/collaboration session
#[async_trait]
pub trait SessionTransport: Send + Sync {
    fn events(&self) -> broadcast::Receiver<SessionEvent>;
    fn connection_state(&self) -> ConnectionState;
    async fn publish(&self, topic: &str, payload: Vec<u8>, reliable: bool)
        -> Result<(), BridgeError>;
    /// Current metadata of every remote participant
    async fn participant_metadata(&self) -> Result<Vec<(ParticipantId, String)>, BridgeError>;
}

/// In-app router of the hosting application
#[async_trait]
pub trait RouterPort: Send + Sync {
    fn app_host(&self) -> String;
    fn current_path(&self) -> String;
    async fn push(&self, path: &str) -> Result<(), BridgeError>;
    /// Paths entered after each completed route change
    fn route_changes(&self) -> broadcast::Receiver<String>;
}

/// Access to the currently rendered page
pub trait PagePort: Send + Sync {
    fn document(&self) -> Arc<RwLock<Document>>;
}

/// User-visible feedback surface
pub trait NotifierPort: Send + Sync {
    fn notify(&self, notice: Notice);
    fn set_navigating(&self, active: bool);
}

#[derive(Clone)]
pub struct BridgePorts {
    pub transport: Arc<dyn SessionTransport>,
    pub router: Arc<dyn RouterPort>,
    pub page: Arc<dyn PagePort>,
    pub notifier: Arc<dyn NotifierPort>,
}
