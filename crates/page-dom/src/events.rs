//! Events recorded by the document when the bridge acts on it

use serde::{Deserialize, Serialize};

use crate::document::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    MouseDown,
    MouseUp,
    Click,
    Input,
    Change,
    Focus,
    Blur,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::Click => "click",
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
        }
    }
}

/// An event delivered to a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
}

/// Vertical alignment requested by `scroll_into_view`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBlock {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollRecord {
    pub target: NodeId,
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}
