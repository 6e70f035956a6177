//! Element locator with fallback chain orchestration

use page_dom::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{errors::LocatorError, strategies::*, types::*};

/// Locator tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorOptions {
    /// Phrase identifying the button to press inside a date-matched card
    pub report_button_phrase: String,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            report_button_phrase: "View Report".to_string(),
        }
    }
}

/// Walks an [`ElementQuery`]'s locator plan and returns the first rendered match
pub struct ElementLocator {
    id_strategy: IdStrategy,
    selector_strategy: SelectorStrategy,
    text_strategy: TextStrategy,
    role_strategy: RoleStrategy,
    name_strategy: NameStrategy,
    date_strategy: DateStrategy,
}

impl ElementLocator {
    pub fn new(options: LocatorOptions) -> Self {
        Self {
            id_strategy: IdStrategy,
            selector_strategy: SelectorStrategy,
            text_strategy: TextStrategy,
            role_strategy: RoleStrategy,
            name_strategy: NameStrategy,
            date_strategy: DateStrategy::new(options.report_button_phrase),
        }
    }

    /// Get strategy by type
    fn get_strategy(&self, strategy_type: LocatorStrategy) -> &dyn Strategy {
        match strategy_type {
            LocatorStrategy::Id => &self.id_strategy,
            LocatorStrategy::Selector => &self.selector_strategy,
            LocatorStrategy::Text => &self.text_strategy,
            LocatorStrategy::Role => &self.role_strategy,
            LocatorStrategy::Name => &self.name_strategy,
            LocatorStrategy::Date => &self.date_strategy,
        }
    }

    /// Resolve `query` to a single rendered element.
    ///
    /// Date-card search only takes part when `include_date` is set. A failing
    /// stage (bad selector, unparseable date) is logged and the chain moves
    /// on; the date parse error is only surfaced when the date was the sole
    /// stage requested.
    pub fn locate(
        &self,
        doc: &Document,
        query: &ElementQuery,
        include_date: bool,
    ) -> Result<Resolution, LocatorError> {
        let plan = query.plan(include_date);
        debug!(query = %query, stages = plan.len(), "locating element");

        let mut sole_error = None;
        for locator in &plan {
            match self.resolve_with(doc, locator) {
                Ok(Some(resolution)) => {
                    info!(
                        strategy = resolution.strategy.name(),
                        element = %doc.describe(resolution.node),
                        confidence = resolution.confidence,
                        "element resolved"
                    );
                    return Ok(resolution);
                }
                Ok(None) => {
                    debug!(locator = %locator, "no rendered candidates");
                }
                Err(err) => {
                    warn!(locator = %locator, error = %err, "locator stage failed");
                    if plan.len() == 1 && matches!(err, LocatorError::InvalidDatePhrase(_)) {
                        sole_error = Some(err);
                    }
                }
            }
        }

        Err(sole_error.unwrap_or_else(|| LocatorError::not_found(query)))
    }

    /// Run one locator through its strategy.
    pub fn resolve_with(
        &self,
        doc: &Document,
        locator: &Locator,
    ) -> Result<Option<Resolution>, LocatorError> {
        let strategy = self.get_strategy(locator.strategy());
        let candidates = strategy.resolve(doc, locator)?;
        Ok(select_best_candidate(&candidates).map(|best| Resolution {
            node: best.node,
            strategy: best.strategy,
            confidence: best.confidence,
            locator: locator.clone(),
        }))
    }
}

impl Default for ElementLocator {
    fn default() -> Self {
        Self::new(LocatorOptions::default())
    }
}

/// Highest confidence wins; ties keep document order.
fn select_best_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().fold(None, |best: Option<&Candidate>, candidate| match best {
        Some(current) if current.confidence >= candidate.confidence => Some(current),
        _ => Some(candidate),
    })
}
