//! Session events, inbound commands and wire messages

use std::fmt;

use action_primitives::{ActionResult, DomAction};
use serde::{Deserialize, Serialize};
use voicenav_core_types::ParticipantId;

use crate::content::PageContentSnapshot;

/// Connectivity of the remote voice session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Everything the session transport reports, normalised across transport
/// library versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Topic-addressed data message
    Data {
        topic: Option<String>,
        payload: Vec<u8>,
        participant: Option<ParticipantId>,
    },
    /// Raw binary payload without topic
    RawData {
        payload: Vec<u8>,
        participant: Option<ParticipantId>,
    },
    MetadataChanged {
        participant: ParticipantId,
        metadata: String,
    },
    Transcription {
        participant: Option<ParticipantId>,
        text: String,
    },
    Connection(ConnectionState),
}

/// Delivery path a command arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Data,
    Raw,
    Metadata,
    Transcription,
    Poll,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Data => "data",
            Channel::Raw => "raw",
            Channel::Metadata => "metadata",
            Channel::Transcription => "transcription",
            Channel::Poll => "poll",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Undecoded inbound item on the session's single inbound stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub channel: Channel,
    pub participant: Option<ParticipantId>,
    pub body: FrameBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    Bytes(Vec<u8>),
    Text(String),
}

impl InboundFrame {
    /// Map a transport event onto a frame. Connection changes and data on
    /// foreign topics are not frames.
    pub fn from_event(event: SessionEvent, accepts_topic: impl Fn(Option<&str>) -> bool) -> Option<Self> {
        match event {
            SessionEvent::Data {
                topic,
                payload,
                participant,
            } => accepts_topic(topic.as_deref()).then_some(Self {
                channel: Channel::Data,
                participant,
                body: FrameBody::Bytes(payload),
            }),
            SessionEvent::RawData {
                payload,
                participant,
            } => Some(Self {
                channel: Channel::Raw,
                participant,
                body: FrameBody::Bytes(payload),
            }),
            SessionEvent::MetadataChanged {
                participant,
                metadata,
            } => Some(Self {
                channel: Channel::Metadata,
                participant: Some(participant),
                body: FrameBody::Text(metadata),
            }),
            SessionEvent::Transcription { participant, text } => Some(Self {
                channel: Channel::Transcription,
                participant,
                body: FrameBody::Text(text),
            }),
            SessionEvent::Connection(_) => None,
        }
    }

    pub fn poll(participant: ParticipantId, metadata: String) -> Self {
        Self {
            channel: Channel::Poll,
            participant: Some(participant),
            body: FrameBody::Text(metadata),
        }
    }
}

/// Normalised command, whatever channel carried it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    Navigate { target: String },
    Dom(DomAction),
}

/// JSON envelope of data and raw payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "agent-navigation-url")]
    NavigateUrl {
        #[serde(default)]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pathname: Option<String>,
    },
    #[serde(rename = "dom-action", rename_all = "camelCase")]
    DomAction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action_id: Option<String>,
        action: DomAction,
    },
}

/// Messages published back to the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "dom-action-result", rename_all = "camelCase")]
    DomActionResult {
        action_id: String,
        result: String,
        success: bool,
    },
    #[serde(rename = "page-content")]
    PageContent { content: PageContentSnapshot },
}

impl From<ActionResult> for OutboundMessage {
    fn from(result: ActionResult) -> Self {
        OutboundMessage::DomActionResult {
            action_id: result.action_id.0,
            result: result.message,
            success: result.success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}
