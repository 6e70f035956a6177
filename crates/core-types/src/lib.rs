use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for crates that only need to report a message upward.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("{message}")]
    Message { message: String },
}

impl VoiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            VoiceError::Message { message } => message,
        }
    }
}

/// One connected period of the remote voice session.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Correlation id of a DOM action, chosen by the remote agent.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ActionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a remote participant in the voice room.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identity carries one of the given markers, ignoring case.
    pub fn matches_any(&self, markers: &[String]) -> bool {
        let identity = self.0.to_lowercase();
        markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| identity.contains(&marker.to_lowercase()))
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_marker_match_is_case_insensitive() {
        let agent = ParticipantId::new("Voice-Agent-42");
        assert!(agent.matches_any(&["agent".to_string()]));
        assert!(!ParticipantId::new("user-7").matches_any(&["agent".to_string()]));
        assert!(!agent.matches_any(&[String::new()]));
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
