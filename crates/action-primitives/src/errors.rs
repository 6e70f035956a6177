//! Error types for action primitives

use action_locator::LocatorError;
use thiserror::Error;
use voicenav_core_types::VoiceError;

/// Error types for action primitive operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No locator stage produced a rendered element
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Action is incompatible with the located element
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// Date phrase could not be parsed into a calendar date
    #[error("Invalid date phrase: {0}")]
    InvalidDatePhrase(String),
}

impl ActionError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::ElementNotFound(_) => "element_not_found",
            ActionError::InvalidTarget(_) => "invalid_target",
            ActionError::UnknownActionType(_) => "unknown_action_type",
            ActionError::InvalidDatePhrase(_) => "invalid_date_phrase",
        }
    }
}

impl From<LocatorError> for ActionError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::ElementNotFound { query } => ActionError::ElementNotFound(query),
            LocatorError::InvalidDatePhrase(phrase) => ActionError::InvalidDatePhrase(phrase),
            other => ActionError::ElementNotFound(other.to_string()),
        }
    }
}

impl From<ActionError> for VoiceError {
    fn from(err: ActionError) -> Self {
        VoiceError::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_errors_map_onto_action_taxonomy() {
        let not_found: ActionError = LocatorError::not_found(r#"{"id":"x"}"#).into();
        assert_eq!(not_found, ActionError::ElementNotFound(r#"{"id":"x"}"#.into()));
        assert_eq!(not_found.code(), "element_not_found");

        let date: ActionError = LocatorError::InvalidDatePhrase("someday".into()).into();
        assert_eq!(date.code(), "invalid_date_phrase");
        assert_eq!(date.to_string(), "Invalid date phrase: someday");
    }
}
