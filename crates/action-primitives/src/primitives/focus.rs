//! Focus primitive

use page_dom::{Document, NodeId, ScrollBehavior, ScrollBlock};

use crate::{errors::ActionError, primitives::short_label};

/// Focus the element and bring it smoothly to the viewport centre.
pub fn execute_focus(doc: &mut Document, node: NodeId) -> Result<String, ActionError> {
    let label = short_label(doc, node);
    if !doc.focus(node) {
        return Err(ActionError::InvalidTarget(format!(
            "{} cannot take focus",
            doc.describe(node)
        )));
    }
    doc.scroll_into_view(node, ScrollBehavior::Smooth, ScrollBlock::Center);
    Ok(format!("Focused \"{label}\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::{el, EventKind, ScrollRecord};

    #[test]
    fn focus_scrolls_to_center() {
        let mut doc = Document::from_spec("", &el("input").attr("name", "q"));
        let input = doc.root();
        assert_eq!(execute_focus(&mut doc, input).unwrap(), "Focused \"q\"");
        assert_eq!(doc.focused(), Some(input));
        assert_eq!(doc.event_count(input, EventKind::Focus), 1);
        assert_eq!(
            doc.scrolls(),
            &[ScrollRecord {
                target: input,
                behavior: ScrollBehavior::Smooth,
                block: ScrollBlock::Center,
            }]
        );
    }
}
