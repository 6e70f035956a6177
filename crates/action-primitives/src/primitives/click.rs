//! Click primitive

use page_dom::{Document, EventKind, NodeId};
use tracing::debug;

use crate::{errors::ActionError, primitives::short_label};

/// Press and release the pointer on the element, then activate it.
///
/// Activation delivers the single `click` event, so listeners observing
/// either the pointer sequence or the click itself fire exactly once.
pub fn execute_click(doc: &mut Document, node: NodeId) -> Result<String, ActionError> {
    let label = short_label(doc, node);
    debug!(element = %doc.describe(node), "dispatching click sequence");

    doc.dispatch(node, EventKind::MouseDown);
    doc.dispatch(node, EventKind::MouseUp);
    doc.activate(node);

    Ok(format!("Clicked \"{label}\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::el;

    #[test]
    fn click_sequence_order() {
        let mut doc = Document::from_spec("", &el("button").text("Go"));
        let button = doc.root();
        let message = execute_click(&mut doc, button).unwrap();
        assert_eq!(message, "Clicked \"Go\"");
        let kinds: Vec<_> = doc.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::MouseDown, EventKind::MouseUp, EventKind::Click]
        );
    }
}
