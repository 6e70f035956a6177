//! Scroll primitive

use page_dom::{Document, NodeId, ScrollBehavior, ScrollBlock};

use crate::{errors::ActionError, primitives::short_label};

/// Smoothly scroll the element to the viewport centre without focusing it.
pub fn execute_scroll(doc: &mut Document, node: NodeId) -> Result<String, ActionError> {
    doc.scroll_into_view(node, ScrollBehavior::Smooth, ScrollBlock::Center);
    Ok(format!("Scrolled to \"{}\"", short_label(doc, node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::el;

    #[test]
    fn scroll_leaves_focus_alone() {
        let mut doc = Document::from_spec(
            "",
            &el("div")
                .child(el("input").id("q"))
                .child(el("section").id("charts").text("Charts")),
        );
        let q = doc.get_element_by_id("q").unwrap();
        let charts = doc.get_element_by_id("charts").unwrap();
        doc.focus(q);

        assert_eq!(execute_scroll(&mut doc, charts).unwrap(), "Scrolled to \"Charts\"");
        assert_eq!(doc.focused(), Some(q));
        assert_eq!(doc.scrolls().len(), 1);
        assert_eq!(doc.scrolls()[0].target, charts);
    }
}
