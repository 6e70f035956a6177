//! Payload decoding for every inbound channel

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::errors::{BridgeError, BridgeResult};
use crate::model::{Channel, InboundCommand, InboundMessage, OutboundMessage};

static NAVIGATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"NAVIGATE:\s*(/[^\s"'<>]*)"#).expect("static regex"));

/// Decode a UTF-8 JSON data or raw payload.
pub fn decode_payload(channel: Channel, payload: &[u8]) -> BridgeResult<InboundCommand> {
    let text = std::str::from_utf8(payload).map_err(|err| BridgeError::decode(channel, err))?;
    let message: InboundMessage =
        serde_json::from_str(text.trim()).map_err(|err| BridgeError::decode(channel, err))?;
    match message {
        InboundMessage::NavigateUrl { url, pathname } => {
            let target = if url.trim().is_empty() {
                pathname.unwrap_or_default()
            } else {
                url
            };
            if target.trim().is_empty() {
                return Err(BridgeError::decode(channel, "navigation without url or pathname"));
            }
            Ok(InboundCommand::Navigate {
                target: target.trim().to_string(),
            })
        }
        InboundMessage::DomAction { action_id, mut action } => {
            // the agent's id is the only thing tying copies on other channels together
            let Some(id) = action_id.filter(|id| !id.trim().is_empty()) else {
                return Err(BridgeError::decode(channel, "dom-action without actionId"));
            };
            action.id = id.trim().into();
            Ok(InboundCommand::Dom(action))
        }
    }
}

/// Extract an embedded `NAVIGATE:/<path>` token from free text.
pub fn decode_transcript(text: &str) -> Option<InboundCommand> {
    NAVIGATE_TOKEN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|path| InboundCommand::Navigate {
            target: path.as_str().to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct MetadataCommand {
    #[serde(default)]
    navigate: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

/// Decode participant metadata: `{navigate?, path?}` JSON or the token form.
///
/// Metadata that is neither (or JSON without a target) carries no command.
pub fn decode_metadata(channel: Channel, metadata: &str) -> BridgeResult<Option<InboundCommand>> {
    let trimmed = metadata.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.starts_with('{') {
        let parsed: MetadataCommand =
            serde_json::from_str(trimmed).map_err(|err| BridgeError::decode(channel, err))?;
        let target = parsed
            .navigate
            .or(parsed.path)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        return Ok(target.map(|target| InboundCommand::Navigate { target }));
    }
    Ok(decode_transcript(trimmed))
}

pub fn encode_outbound(message: &OutboundMessage) -> BridgeResult<Vec<u8>> {
    serde_json::to_vec(message).map_err(|err| BridgeError::Transport(err.to_string()))
}
