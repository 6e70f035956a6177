//! Action and result types

use std::fmt;

use action_locator::ElementQuery;
use serde::{Deserialize, Serialize};
use voicenav_core_types::ActionId;

/// Kind of DOM action.
///
/// Unrecognised names are kept as [`ActionKind::Unknown`] so they can be
/// answered with a failed result instead of being dropped at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    Click,
    Fill,
    Read,
    Focus,
    Scroll,
    Unknown(String),
}

impl ActionKind {
    pub fn name(&self) -> &str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Read => "read",
            ActionKind::Focus => "focus",
            ActionKind::Scroll => "scroll",
            ActionKind::Unknown(name) => name,
        }
    }
}

impl From<String> for ActionKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "click" => ActionKind::Click,
            "fill" => ActionKind::Fill,
            "read" => ActionKind::Read,
            "focus" => ActionKind::Focus,
            "scroll" => ActionKind::Scroll,
            _ => ActionKind::Unknown(value),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One DOM action requested by the remote agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomAction {
    /// Correlation id; the bridge sets it from the envelope's required `actionId`
    #[serde(default)]
    pub id: ActionId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub target: ElementQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl DomAction {
    pub fn new(id: impl Into<ActionId>, kind: ActionKind, target: ElementQuery) -> Self {
        Self {
            id: id.into(),
            kind,
            target,
            value: None,
        }
    }

    pub fn click(id: impl Into<ActionId>, target: ElementQuery) -> Self {
        Self::new(id, ActionKind::Click, target)
    }

    pub fn fill(id: impl Into<ActionId>, target: ElementQuery, value: &str) -> Self {
        Self::new(id, ActionKind::Fill, target).with_value(value)
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

/// Outcome of one action, correlated by `action_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub action_id: ActionId,
    pub success: bool,
    /// Confirmation or read text on success, error message on failure
    pub message: String,
}

impl ActionResult {
    pub fn success(action_id: ActionId, message: impl Into<String>) -> Self {
        Self {
            action_id,
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(action_id: ActionId, message: impl Into<String>) -> Self {
        Self {
            action_id,
            success: false,
            message: message.into(),
        }
    }
}
