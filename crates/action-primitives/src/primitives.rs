//! Action primitives implementation
//!
//! Five primitives acting on a located element:
//! 1. click - mousedown, mouseup, then native activation
//! 2. fill - set the value of a text-like field and notify listeners
//! 3. read - current text or form value
//! 4. focus - focus and scroll into the viewport centre
//! 5. scroll - scroll into the viewport centre without focusing

mod click;
mod fill;
mod focus;
mod read;
mod scroll;

pub use click::*;
pub use fill::*;
pub use focus::*;
pub use read::*;
pub use scroll::*;

use std::time::Instant;

use action_locator::{ElementLocator, LocatorOptions};
use page_dom::{Document, NodeId};
use tracing::{info, instrument, warn};

use crate::{
    errors::ActionError,
    types::{ActionKind, ActionResult, DomAction},
};

const MAX_LABEL_CHARS: usize = 80;

/// Resolves an action's target and runs the matching primitive
pub struct ActionExecutor {
    locator: ElementLocator,
}

impl ActionExecutor {
    pub fn new(options: LocatorOptions) -> Self {
        Self {
            locator: ElementLocator::new(options),
        }
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    /// Execute `action`, folding every failure into the returned result.
    #[instrument(skip_all, fields(action_id = %action.id, kind = %action.kind))]
    pub fn execute(&self, doc: &mut Document, action: &DomAction) -> ActionResult {
        let start = Instant::now();
        match self.try_execute(doc, action) {
            Ok(message) => {
                info!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    "action completed"
                );
                ActionResult::success(action.id.clone(), message)
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "action failed");
                ActionResult::failure(action.id.clone(), err.to_string())
            }
        }
    }

    /// Execute `action` and return the primitive's message.
    pub fn try_execute(&self, doc: &mut Document, action: &DomAction) -> Result<String, ActionError> {
        if let ActionKind::Unknown(name) = &action.kind {
            return Err(ActionError::UnknownActionType(name.clone()));
        }

        let include_date = action.kind == ActionKind::Click;
        let resolution = self.locator.locate(doc, &action.target, include_date)?;
        let node = resolution.node;

        match &action.kind {
            ActionKind::Click => execute_click(doc, node),
            ActionKind::Fill => execute_fill(doc, node, action.value.as_deref().unwrap_or("")),
            ActionKind::Read => Ok(execute_read(doc, node)),
            ActionKind::Focus => execute_focus(doc, node),
            ActionKind::Scroll => execute_scroll(doc, node),
            ActionKind::Unknown(name) => Err(ActionError::UnknownActionType(name.clone())),
        }
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(LocatorOptions::default())
    }
}

/// Element label for confirmation messages, shortened for long cards.
pub(crate) fn short_label(doc: &Document, node: NodeId) -> String {
    let label = doc.label(node);
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label;
    }
    let mut short: String = label.chars().take(MAX_LABEL_CHARS).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::ElementQuery;
    use page_dom::{el, EventKind};

    fn page() -> Document {
        Document::from_spec(
            "Reports",
            &el("main")
                .child(el("button").id("view").text("View Report"))
                .child(el("input").id("email").attr("type", "email"))
                .child(
                    el("div")
                        .class("card")
                        .child(el("h4").text("Nov 2, 2025"))
                        .child(el("button").id("open").text("View Report")),
                ),
        )
    }

    #[test]
    fn click_by_text_fires_one_click() {
        let mut doc = page();
        let executor = ActionExecutor::default();
        let result = executor.execute(
            &mut doc,
            &DomAction::click("a1", ElementQuery::by_id("view")),
        );
        assert!(result.success, "{}", result.message);
        assert_eq!(result.message, r#"Clicked "View Report""#);
        let view = doc.get_element_by_id("view").unwrap();
        assert_eq!(doc.event_count(view, EventKind::Click), 1);
    }

    #[test]
    fn unknown_kind_is_reported_without_locating() {
        let mut doc = page();
        let action = DomAction::new(
            "a2",
            ActionKind::Unknown("hover".into()),
            ElementQuery::by_id("missing"),
        );
        let err = ActionExecutor::default()
            .try_execute(&mut doc, &action)
            .unwrap_err();
        assert_eq!(err, ActionError::UnknownActionType("hover".into()));
    }

    #[test]
    fn missing_element_fails_with_query() {
        let mut doc = page();
        let result = ActionExecutor::default().execute(
            &mut doc,
            &DomAction::click("a3", ElementQuery::by_id("nope")),
        );
        assert!(!result.success);
        assert_eq!(result.action_id.as_str(), "a3");
        assert!(result.message.contains(r#"{"id":"nope"}"#));
    }

    #[test]
    fn date_targets_only_resolve_for_clicks() {
        let mut doc = page();
        let executor = ActionExecutor::default();
        let click = executor
            .try_execute(
                &mut doc,
                &DomAction::click("a4", ElementQuery::by_date("2 November 2025")),
            )
            .unwrap();
        assert_eq!(click, r#"Clicked "View Report""#);
        let open = doc.get_element_by_id("open").unwrap();
        assert_eq!(doc.event_count(open, EventKind::Click), 1);

        let read = DomAction::new("a5", ActionKind::Read, ElementQuery::by_date("2 November 2025"));
        assert!(matches!(
            executor.try_execute(&mut doc, &read),
            Err(ActionError::ElementNotFound(_))
        ));
    }

    #[test]
    fn fill_without_value_clears_the_field() {
        let mut doc = page();
        let email = doc.get_element_by_id("email").unwrap();
        doc.set_value(email, "old@example.com");
        let action = DomAction::new("a6", ActionKind::Fill, ElementQuery::by_id("email"));
        let result = ActionExecutor::default().execute(&mut doc, &action);
        assert!(result.success);
        assert_eq!(doc.value(email).as_deref(), Some(""));
    }

    #[test]
    fn long_labels_are_shortened() {
        let text = "x".repeat(200);
        let doc = Document::from_spec("", &el("p").text(&text));
        let label = short_label(&doc, doc.root());
        assert_eq!(label.chars().count(), MAX_LABEL_CHARS + 1);
    }
}
