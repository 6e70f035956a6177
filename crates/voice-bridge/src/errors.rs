use thiserror::Error;
use voicenav_core_types::VoiceError;
use voicenav_event_bus::BusError;

use crate::model::Channel;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Malformed inbound payload on one channel
    #[error("undecodable {channel} payload: {reason}")]
    DecodeFailure { channel: Channel, reason: String },
    /// Navigation target on a foreign host
    #[error("blocked navigation to {host} (app host is {app_host})")]
    BlockedCrossOrigin { host: String, app_host: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("route change failed: {0}")]
    Route(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn decode(channel: Channel, reason: impl ToString) -> Self {
        BridgeError::DecodeFailure {
            channel,
            reason: reason.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::DecodeFailure { .. } => "decode_failure",
            BridgeError::BlockedCrossOrigin { .. } => "blocked_cross_origin",
            BridgeError::Transport(_) => "transport",
            BridgeError::Route(_) => "route",
        }
    }
}

impl From<BusError> for BridgeError {
    fn from(err: BusError) -> Self {
        BridgeError::Transport(err.to_string())
    }
}

impl From<BridgeError> for VoiceError {
    fn from(err: BridgeError) -> Self {
        VoiceError::new(err.to_string())
    }
}
