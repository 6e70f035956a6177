//! Error types for the page model

use thiserror::Error;

/// Selector parse failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Selector (or one entry of a list) is empty
    #[error("empty selector")]
    Empty,

    /// Character that cannot start or continue a selector
    #[error("unexpected '{found}' at {position} in selector")]
    Unexpected { found: char, position: usize },

    /// Syntax the engine deliberately does not support
    #[error("unsupported selector syntax: {0}")]
    Unsupported(String),

    /// Attribute selector without a closing bracket or quote
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
}
