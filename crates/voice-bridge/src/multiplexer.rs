//! Folds the five inbound channels into one command stream

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use voicenav_core_types::ParticipantId;

use crate::codec::{decode_metadata, decode_payload, decode_transcript};
use crate::dedup::DedupGuard;
use crate::errors::{BridgeError, BridgeResult};
use crate::model::{Channel, FrameBody, InboundCommand, InboundFrame};
use crate::policy::BridgePolicy;

/// Decoding and duplicate suppression for one session.
///
/// Owned by the session's pump task, so frames are accepted strictly in
/// arrival order and every dedup read-then-write happens under one borrow.
#[derive(Debug)]
pub struct Multiplexer {
    guard: DedupGuard,
    agent_markers: Vec<String>,
}

impl Multiplexer {
    pub fn new(policy: &BridgePolicy) -> Self {
        Self {
            guard: DedupGuard::new(
                Duration::from_millis(policy.dedup_window_ms),
                policy.action_id_capacity,
            ),
            agent_markers: policy.agent_markers.clone(),
        }
    }

    pub fn is_agent(&self, participant: Option<&ParticipantId>) -> bool {
        participant.is_some_and(|p| p.matches_any(&self.agent_markers))
    }

    /// Decode `frame` and admit the command it carries, if any.
    ///
    /// `nav_key` maps a navigation target to its canonical key so equal
    /// destinations coalesce whichever channel and spelling delivered them.
    /// `Ok(None)` means the frame carried nothing new.
    pub fn accept(
        &mut self,
        frame: InboundFrame,
        now: Instant,
        nav_key: impl Fn(&str) -> String,
    ) -> BridgeResult<Option<InboundCommand>> {
        let channel = frame.channel;
        let needs_agent = matches!(
            channel,
            Channel::Metadata | Channel::Transcription | Channel::Poll
        );
        if needs_agent && !self.is_agent(frame.participant.as_ref()) {
            debug!(%channel, participant = ?frame.participant, "ignoring non-agent participant");
            return Ok(None);
        }

        let command = match (channel, frame.body) {
            (Channel::Data | Channel::Raw, FrameBody::Bytes(bytes)) => {
                Some(decode_payload(channel, &bytes)?)
            }
            (Channel::Data | Channel::Raw, FrameBody::Text(text)) => {
                Some(decode_payload(channel, text.as_bytes())?)
            }
            (Channel::Metadata | Channel::Poll, FrameBody::Text(metadata)) => {
                let Some(participant) = frame.participant.as_ref() else {
                    return Ok(None);
                };
                if !self.guard.metadata_changed(participant, &metadata) {
                    return Ok(None);
                }
                decode_metadata(channel, &metadata)?
            }
            (Channel::Transcription, FrameBody::Text(text)) => decode_transcript(&text),
            (_, FrameBody::Bytes(_)) => {
                return Err(BridgeError::decode(channel, "expected text body"));
            }
        };
        let Some(command) = command else {
            return Ok(None);
        };

        let admitted = match &command {
            InboundCommand::Dom(action) => self.guard.admit_action(&action.id),
            InboundCommand::Navigate { target } => self.guard.admit_key(&nav_key(target), now),
        };
        if !admitted {
            debug!(%channel, command = ?command, "duplicate command dropped");
            return Ok(None);
        }
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(channel: Channel, participant: &str, body: &str) -> InboundFrame {
        let body = match channel {
            Channel::Data | Channel::Raw => FrameBody::Bytes(body.as_bytes().to_vec()),
            _ => FrameBody::Text(body.to_string()),
        };
        InboundFrame {
            channel,
            participant: Some(ParticipantId::new(participant)),
            body,
        }
    }

    fn key(target: &str) -> String {
        format!("nav:/{}", target.trim_start_matches('/'))
    }

    const NAV_BOTS: &str = r#"{"type":"agent-navigation-url","url":"/bots"}"#;
    const CLICK_A1: &str =
        r#"{"type":"dom-action","actionId":"a1","action":{"type":"click","target":{"text":"Go"}}}"#;

    #[test]
    fn same_navigation_on_every_channel_is_admitted_once() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let now = Instant::now();
        let frames = [
            frame(Channel::Data, "agent-1", NAV_BOTS),
            frame(Channel::Raw, "agent-1", NAV_BOTS),
            frame(Channel::Metadata, "agent-1", r#"{"navigate":"/bots"}"#),
            frame(Channel::Transcription, "agent-1", "NAVIGATE:/bots"),
            frame(Channel::Poll, "agent-1", r#"{"navigate":"/bots"}"#),
        ];
        let admitted: Vec<_> = frames
            .into_iter()
            .filter_map(|f| mux.accept(f, now, key).unwrap())
            .collect();
        assert_eq!(admitted, vec![InboundCommand::Navigate { target: "/bots".into() }]);
    }

    #[test]
    fn navigation_repeats_after_window() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let start = Instant::now();
        assert!(mux
            .accept(frame(Channel::Data, "agent", NAV_BOTS), start, key)
            .unwrap()
            .is_some());
        assert!(mux
            .accept(
                frame(Channel::Data, "agent", NAV_BOTS),
                start + Duration::from_millis(1600),
                key
            )
            .unwrap()
            .is_some());
    }

    #[test]
    fn dom_actions_execute_once_per_id() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let start = Instant::now();
        assert!(mux
            .accept(frame(Channel::Data, "agent", CLICK_A1), start, key)
            .unwrap()
            .is_some());
        let later = start + Duration::from_secs(60);
        assert!(mux
            .accept(frame(Channel::Raw, "agent", CLICK_A1), later, key)
            .unwrap()
            .is_none());
    }

    #[test]
    fn dom_actions_without_id_are_rejected_on_every_channel() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let now = Instant::now();
        let anonymous = r#"{"type":"dom-action","action":{"type":"click","target":{"text":"Go"}}}"#;
        let blank = r#"{"type":"dom-action","actionId":"  ","action":{"type":"click","target":{"text":"Go"}}}"#;
        for payload in [anonymous, blank] {
            for channel in [Channel::Data, Channel::Raw] {
                let err = mux
                    .accept(frame(channel, "agent", payload), now, key)
                    .unwrap_err();
                assert_eq!(err.code(), "decode_failure", "{channel}");
            }
        }
        assert!(mux
            .accept(frame(Channel::Raw, "agent", CLICK_A1), now, key)
            .unwrap()
            .is_some());
    }

    #[test]
    fn only_agents_steer_metadata_and_transcripts() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let now = Instant::now();
        assert!(mux
            .accept(frame(Channel::Transcription, "user-7", "NAVIGATE:/bots"), now, key)
            .unwrap()
            .is_none());
        assert!(mux
            .accept(frame(Channel::Metadata, "user-7", r#"{"navigate":"/bots"}"#), now, key)
            .unwrap()
            .is_none());
        assert!(mux
            .accept(frame(Channel::Data, "user-7", NAV_BOTS), now, key)
            .unwrap()
            .is_some());
    }

    #[test]
    fn unchanged_metadata_is_not_decoded_again() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let now = Instant::now();
        let err = mux
            .accept(frame(Channel::Poll, "agent", "{broken"), now, key)
            .unwrap_err();
        assert_eq!(err.code(), "decode_failure");
        assert!(mux
            .accept(frame(Channel::Poll, "agent", "{broken"), now, key)
            .unwrap()
            .is_none());
    }

    #[test]
    fn decode_failure_does_not_poison_other_frames() {
        let mut mux = Multiplexer::new(&BridgePolicy::default());
        let now = Instant::now();
        assert!(mux
            .accept(frame(Channel::Raw, "agent", "garbage"), now, key)
            .is_err());
        assert!(mux
            .accept(frame(Channel::Data, "agent", CLICK_A1), now, key)
            .unwrap()
            .is_some());
    }
}
