//! Fill primitive - Set the value of a text-like field

use page_dom::{Document, EventKind, NodeId};
use tracing::debug;

use crate::{errors::ActionError, primitives::short_label};

const TEXT_INPUT_TYPES: [&str; 8] = [
    "text", "email", "password", "search", "tel", "url", "number", "date",
];

/// Whether the element accepts typed text
pub fn is_fillable(doc: &Document, node: NodeId) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    if element.has_attr("disabled") || element.has_attr("readonly") {
        return false;
    }
    match element.tag.as_str() {
        "textarea" => true,
        "input" => {
            let kind = element.attr("type").unwrap_or("text").trim().to_ascii_lowercase();
            TEXT_INPUT_TYPES.contains(&kind.as_str())
        }
        _ => is_content_editable(doc, node),
    }
}

fn is_content_editable(doc: &Document, node: NodeId) -> bool {
    doc.attr(node, "contenteditable")
        .map(|value| !value.trim().eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}

/// Set the value and dispatch `input` then `change`.
pub fn execute_fill(doc: &mut Document, node: NodeId, value: &str) -> Result<String, ActionError> {
    let label = short_label(doc, node);
    if !is_fillable(doc, node) {
        return Err(ActionError::InvalidTarget(format!(
            "{} is not a text field",
            doc.describe(node)
        )));
    }

    if is_content_editable(doc, node) {
        doc.set_text(node, value);
    } else {
        doc.set_value(node, value);
    }
    debug!(element = %doc.describe(node), chars = value.chars().count(), "value set");

    doc.dispatch(node, EventKind::Input);
    doc.dispatch(node, EventKind::Change);

    Ok(format!("Filled \"{label}\" with \"{value}\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::el;

    fn form() -> Document {
        Document::from_spec(
            "Form",
            &el("form")
                .child(el("input").id("name").attr("placeholder", "Your name"))
                .child(el("input").id("agree").attr("type", "checkbox"))
                .child(el("input").id("locked").attr("disabled", ""))
                .child(el("input").id("fixed").attr("readonly", "").attr("value", "keep"))
                .child(el("textarea").id("log").attr("readonly", "").text("history"))
                .child(el("div").id("editor").attr("contenteditable", "true").text("draft"))
                .child(el("button").id("send").text("Send")),
        )
    }

    #[test]
    fn fill_sets_value_and_notifies_once() {
        let mut doc = form();
        let name = doc.get_element_by_id("name").unwrap();
        let message = execute_fill(&mut doc, name, "x").unwrap();
        assert_eq!(message, "Filled \"Your name\" with \"x\"");
        assert_eq!(doc.value(name).as_deref(), Some("x"));
        assert_eq!(doc.event_count(name, EventKind::Input), 1);
        assert_eq!(doc.event_count(name, EventKind::Change), 1);
        let kinds: Vec<_> = doc.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Input, EventKind::Change]);
    }

    #[test]
    fn non_text_targets_are_rejected() {
        let mut doc = form();
        for id in ["agree", "locked", "fixed", "log", "send"] {
            let node = doc.get_element_by_id(id).unwrap();
            let err = execute_fill(&mut doc, node, "x").unwrap_err();
            assert_eq!(err.code(), "invalid_target", "{id}");
            assert_eq!(doc.event_count(node, EventKind::Input), 0);
        }
        let fixed = doc.get_element_by_id("fixed").unwrap();
        assert_eq!(doc.value(fixed).as_deref(), Some("keep"));
    }

    #[test]
    fn content_editable_replaces_text() {
        let mut doc = form();
        let editor = doc.get_element_by_id("editor").unwrap();
        execute_fill(&mut doc, editor, "final copy").unwrap();
        assert_eq!(doc.inner_text(editor), "final copy");
    }
}
