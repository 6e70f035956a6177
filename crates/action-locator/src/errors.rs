//! Error types for locator system

use page_dom::SelectorError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// No strategy produced a rendered element; carries the original query
    #[error("Element not found: {query}")]
    ElementNotFound { query: String },

    /// Date phrase could not be parsed into a calendar date
    #[error("Invalid date phrase: {0}")]
    InvalidDatePhrase(String),

    /// Selector could not be parsed
    #[error("Invalid selector '{selector}': {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: SelectorError,
    },

    /// Strategy execution failed
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },
}

impl LocatorError {
    pub fn not_found(query: impl ToString) -> Self {
        LocatorError::ElementNotFound {
            query: query.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            LocatorError::ElementNotFound { .. } => "element_not_found",
            LocatorError::InvalidDatePhrase(_) => "invalid_date_phrase",
            LocatorError::InvalidSelector { .. } => "invalid_selector",
            LocatorError::StrategyFailed { .. } => "strategy_failed",
        }
    }
}
