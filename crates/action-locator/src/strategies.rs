//! Element resolution strategies
//!
//! One strategy per [`Locator`] variant, in fallback order:
//! 1. Id - exact `id` attribute
//! 2. Selector - CSS selector, optionally indexed
//! 3. Text - visible text or aria-label of clickable elements
//! 4. Role - explicit or implicit ARIA role
//! 5. Name - `name` attribute of form fields
//! 6. Date - report card carrying a spoken date
//!
//! Every strategy only returns rendered elements.

use page_dom::{Document, NodeId};
use tracing::debug;

use crate::date_phrase::find_card_by_date;
use crate::errors::LocatorError;
use crate::types::{Candidate, Locator, LocatorStrategy};

/// Strategy trait for element resolution
pub trait Strategy: Send + Sync {
    /// Candidates for `locator`, best first. Locators of another kind yield
    /// an empty list.
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError>;

    /// Get strategy type
    fn strategy_type(&self) -> LocatorStrategy;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// Exact id lookup
pub struct IdStrategy;

impl Strategy for IdStrategy {
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError> {
        let Locator::Id(id) = locator else {
            return Ok(Vec::new());
        };
        Ok(doc
            .get_element_by_id(id)
            .filter(|node| doc.is_rendered(*node))
            .map(|node| Candidate::new(node, LocatorStrategy::Id, 1.0))
            .into_iter()
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Id
    }
}

/// CSS selector lookup; `index` picks the n-th rendered match (0-based)
pub struct SelectorStrategy;

impl Strategy for SelectorStrategy {
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError> {
        let Locator::Selector { selector, index } = locator else {
            return Ok(Vec::new());
        };
        let matches = doc
            .query_selector_all(selector)
            .map_err(|source| LocatorError::InvalidSelector {
                selector: selector.clone(),
                source,
            })?;
        let rendered = rendered_only(doc, matches);
        debug!(selector = %selector, matches = rendered.len(), "selector lookup");
        Ok(pick(rendered, *index)
            .map(|node| Candidate::new(node, LocatorStrategy::Selector, 0.95))
            .into_iter()
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Selector
    }
}

/// Visible text or aria-label match over clickable elements.
///
/// Exact (case-insensitive, trimmed) matches win over substring matches; only
/// when no element matches exactly are substring hits returned.
pub struct TextStrategy;

impl Strategy for TextStrategy {
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError> {
        let Locator::Text(text) = locator else {
            return Ok(Vec::new());
        };
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let clickables: Vec<(NodeId, String, String)> = doc
            .elements()
            .into_iter()
            .filter(|node| is_clickable(doc, *node) && doc.is_rendered(*node))
            .map(|node| {
                let text = doc.inner_text(node).to_lowercase();
                let aria = doc
                    .attr(node, "aria-label")
                    .map(|label| label.trim().to_lowercase())
                    .unwrap_or_default();
                (node, text, aria)
            })
            .collect();

        let exact: Vec<Candidate> = clickables
            .iter()
            .filter(|(_, text, aria)| *text == needle || *aria == needle)
            .map(|(node, _, _)| Candidate::new(*node, LocatorStrategy::Text, 0.9))
            .collect();
        if !exact.is_empty() {
            return Ok(exact);
        }

        Ok(clickables
            .iter()
            .filter(|(_, text, aria)| text.contains(&needle) || aria.contains(&needle))
            .map(|(node, _, _)| Candidate::new(*node, LocatorStrategy::Text, 0.6))
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Text
    }
}

/// Explicit `role` attribute or the element's implicit role
pub struct RoleStrategy;

impl Strategy for RoleStrategy {
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError> {
        let Locator::Role { role, index } = locator else {
            return Ok(Vec::new());
        };
        let wanted = role.trim().to_lowercase();
        let matches: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|node| element_role(doc, *node).is_some_and(|r| r == wanted))
            .collect();
        Ok(pick(rendered_only(doc, matches), *index)
            .map(|node| Candidate::new(node, LocatorStrategy::Role, 0.8))
            .into_iter()
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Role
    }
}

/// `name` attribute lookup
pub struct NameStrategy;

impl Strategy for NameStrategy {
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError> {
        let Locator::Name { name, index } = locator else {
            return Ok(Vec::new());
        };
        let matches: Vec<NodeId> = doc
            .elements()
            .into_iter()
            .filter(|node| doc.attr(*node, "name") == Some(name.as_str()))
            .collect();
        Ok(pick(rendered_only(doc, matches), *index)
            .map(|node| Candidate::new(node, LocatorStrategy::Name, 0.85))
            .into_iter()
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Name
    }
}

/// Report card lookup by spoken date.
///
/// Within the matched card, a clickable whose text or aria-label contains
/// `target_phrase` is preferred; otherwise the card itself is returned.
pub struct DateStrategy {
    target_phrase: String,
}

impl DateStrategy {
    pub fn new(target_phrase: impl Into<String>) -> Self {
        Self {
            target_phrase: target_phrase.into(),
        }
    }

    fn target_in_card(&self, doc: &Document, card: NodeId) -> Option<NodeId> {
        let phrase = self.target_phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return None;
        }
        doc.descendants(card).into_iter().find(|node| {
            is_clickable(doc, *node)
                && doc.is_rendered(*node)
                && (doc.inner_text(*node).to_lowercase().contains(&phrase)
                    || doc
                        .attr(*node, "aria-label")
                        .is_some_and(|label| label.to_lowercase().contains(&phrase)))
        })
    }
}

impl Default for DateStrategy {
    fn default() -> Self {
        Self::new("View Report")
    }
}

impl Strategy for DateStrategy {
    fn resolve(&self, doc: &Document, locator: &Locator) -> Result<Vec<Candidate>, LocatorError> {
        let Locator::Date(phrase) = locator else {
            return Ok(Vec::new());
        };
        let Some(found) = find_card_by_date(doc, phrase)? else {
            return Ok(Vec::new());
        };
        let node = match self.target_in_card(doc, found.card) {
            Some(button) => button,
            None => {
                debug!(
                    card = %doc.describe(found.card),
                    phrase = %self.target_phrase,
                    "no target button in card, using the card itself"
                );
                found.card
            }
        };
        Ok(vec![Candidate::new(node, LocatorStrategy::Date, 0.7)])
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Date
    }
}

/// Whether the element is something a user would click: buttons, links,
/// `role=button`, `onclick` handlers and `tabindex="0"`.
pub fn is_clickable(doc: &Document, node: NodeId) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    matches!(element.tag.as_str(), "button" | "a")
        || element
            .attr("role")
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("button"))
        || element.has_attr("onclick")
        || element.attr("tabindex").is_some_and(|t| t.trim() == "0")
}

/// Explicit role, else the implicit role of common elements.
pub fn element_role(doc: &Document, node: NodeId) -> Option<String> {
    let element = doc.element(node)?;
    if let Some(role) = element.attr("role").map(str::trim).filter(|r| !r.is_empty()) {
        return Some(role.to_lowercase());
    }
    let implicit = match element.tag.as_str() {
        "button" => "button",
        "a" if element.has_attr("href") => "link",
        "textarea" => "textbox",
        "select" => "combobox",
        "nav" => "navigation",
        "main" => "main",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "ul" | "ol" => "list",
        "li" => "listitem",
        "input" => match element
            .attr("type")
            .map(|t| t.to_ascii_lowercase())
            .as_deref()
            .unwrap_or("text")
        {
            "text" | "email" | "tel" | "url" | "search" | "password" => "textbox",
            "checkbox" => "checkbox",
            "radio" => "radio",
            "button" | "submit" | "reset" => "button",
            "number" => "spinbutton",
            "range" => "slider",
            _ => return None,
        },
        _ => return None,
    };
    Some(implicit.to_string())
}

fn rendered_only(doc: &Document, nodes: Vec<NodeId>) -> Vec<NodeId> {
    nodes
        .into_iter()
        .filter(|node| doc.is_rendered(*node))
        .collect()
}

fn pick(nodes: Vec<NodeId>, index: Option<usize>) -> Option<NodeId> {
    nodes.into_iter().nth(index.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::el;

    fn toolbar() -> Document {
        Document::from_spec(
            "Toolbar",
            &el("main")
                .child(el("button").id("hidden-save").attr("hidden", "").text("Save"))
                .child(el("button").id("save-draft").text("Save draft"))
                .child(el("button").id("save").text("  save "))
                .child(
                    el("div")
                        .id("close")
                        .attr("role", "button")
                        .attr("aria-label", "Close dialog"),
                )
                .child(el("span").id("plain").text("Save"))
                .child(el("a").id("docs").attr("href", "/docs").text("Docs"))
                .child(el("input").id("q").attr("name", "query"))
                .child(el("textarea").id("notes").attr("name", "notes")),
        )
    }

    fn ids(doc: &Document, candidates: &[Candidate]) -> Vec<String> {
        candidates
            .iter()
            .filter_map(|c| doc.attr(c.node, "id").map(str::to_string))
            .collect()
    }

    #[test]
    fn id_strategy_skips_hidden_elements() {
        let doc = toolbar();
        let found = IdStrategy.resolve(&doc, &Locator::Id("save".into())).unwrap();
        assert_eq!(ids(&doc, &found), vec!["save"]);
        let hidden = IdStrategy
            .resolve(&doc, &Locator::Id("hidden-save".into()))
            .unwrap();
        assert!(hidden.is_empty());
        assert!(IdStrategy
            .resolve(&doc, &Locator::Id("missing".into()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn selector_index_counts_rendered_matches() {
        let doc = toolbar();
        let second = SelectorStrategy
            .resolve(
                &doc,
                &Locator::Selector {
                    selector: "main > button".into(),
                    index: Some(1),
                },
            )
            .unwrap();
        assert_eq!(ids(&doc, &second), vec!["save"]);

        let out_of_range = SelectorStrategy
            .resolve(
                &doc,
                &Locator::Selector {
                    selector: "button".into(),
                    index: Some(9),
                },
            )
            .unwrap();
        assert!(out_of_range.is_empty());

        let err = SelectorStrategy
            .resolve(
                &doc,
                &Locator::Selector {
                    selector: "button:first-child".into(),
                    index: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "invalid_selector");
    }

    #[test]
    fn text_prefers_exact_over_substring() {
        let doc = toolbar();
        let exact = TextStrategy
            .resolve(&doc, &Locator::Text("SAVE".into()))
            .unwrap();
        assert_eq!(ids(&doc, &exact), vec!["save"]);

        let partial = TextStrategy
            .resolve(&doc, &Locator::Text("draft".into()))
            .unwrap();
        assert_eq!(ids(&doc, &partial), vec!["save-draft"]);
        assert!(partial[0].confidence < exact[0].confidence);

        let aria = TextStrategy
            .resolve(&doc, &Locator::Text("close dialog".into()))
            .unwrap();
        assert_eq!(ids(&doc, &aria), vec!["close"]);
    }

    #[test]
    fn role_uses_implicit_roles() {
        let doc = toolbar();
        let link = RoleStrategy
            .resolve(
                &doc,
                &Locator::Role {
                    role: "link".into(),
                    index: None,
                },
            )
            .unwrap();
        assert_eq!(ids(&doc, &link), vec!["docs"]);

        let textbox = RoleStrategy
            .resolve(
                &doc,
                &Locator::Role {
                    role: "textbox".into(),
                    index: Some(1),
                },
            )
            .unwrap();
        assert_eq!(ids(&doc, &textbox), vec!["notes"]);

        let explicit = RoleStrategy
            .resolve(
                &doc,
                &Locator::Role {
                    role: "button".into(),
                    index: Some(2),
                },
            )
            .unwrap();
        assert_eq!(ids(&doc, &explicit), vec!["close"]);
    }

    #[test]
    fn name_matches_form_fields() {
        let doc = toolbar();
        let found = NameStrategy
            .resolve(
                &doc,
                &Locator::Name {
                    name: "query".into(),
                    index: None,
                },
            )
            .unwrap();
        assert_eq!(ids(&doc, &found), vec!["q"]);
    }

    #[test]
    fn date_prefers_view_report_button() {
        let doc = Document::from_spec(
            "Reports",
            &el("main")
                .child(
                    el("div")
                        .id("with-button")
                        .class("card")
                        .child(el("h3").text("2 November 2025"))
                        .child(el("button").id("view").text("View Report")),
                )
                .child(
                    el("div")
                        .id("bare")
                        .class("card")
                        .child(el("h3").text("3 November 2025")),
                ),
        );
        let strategy = DateStrategy::default();
        let button = strategy
            .resolve(&doc, &Locator::Date("Nov 2, 2025".into()))
            .unwrap();
        assert_eq!(ids(&doc, &button), vec!["view"]);

        let card = strategy
            .resolve(&doc, &Locator::Date("2025-11-03".into()))
            .unwrap();
        assert_eq!(ids(&doc, &card), vec!["bare"]);

        let bad = strategy
            .resolve(&doc, &Locator::Date("someday".into()))
            .unwrap_err();
        assert!(matches!(bad, LocatorError::InvalidDatePhrase(_)));
    }

    #[test]
    fn strategies_ignore_foreign_locators() {
        let doc = toolbar();
        assert!(IdStrategy
            .resolve(&doc, &Locator::Text("Save".into()))
            .unwrap()
            .is_empty());
        assert_eq!(DateStrategy::default().name(), "date");
    }
}
