//! Read primitive

use page_dom::{Document, NodeId};

/// Current value of form fields, trimmed text of anything else; empty when
/// there is nothing to read.
pub fn execute_read(doc: &Document, node: NodeId) -> String {
    let is_field = matches!(doc.tag(node), Some("input" | "textarea" | "select"));
    if is_field {
        return doc
            .value(node)
            .map(|value| value.trim().to_string())
            .unwrap_or_default();
    }
    doc.inner_text(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::el;

    #[test]
    fn reads_text_values_and_empty() {
        let mut doc = Document::from_spec(
            "",
            &el("div")
                .child(el("p").id("total").text("  Total:\n 42 "))
                .child(el("input").id("q").attr("value", " preset "))
                .child(el("span").id("empty")),
        );
        let total = doc.get_element_by_id("total").unwrap();
        let q = doc.get_element_by_id("q").unwrap();
        let empty = doc.get_element_by_id("empty").unwrap();
        assert_eq!(execute_read(&doc, total), "Total: 42");
        assert_eq!(execute_read(&doc, q), "preset");
        assert_eq!(execute_read(&doc, empty), "");

        doc.set_value(q, "typed");
        assert_eq!(execute_read(&doc, q), "typed");
    }
}
