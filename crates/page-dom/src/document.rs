//! Arena-backed element tree

use serde::{Deserialize, Serialize};

use crate::errors::SelectorError;
use crate::events::{DomEvent, EventKind, ScrollBehavior, ScrollBlock, ScrollRecord};
use crate::selector::{parse_selector, SelectorList};
use crate::spec::{ElementSpec, NodeSpec};

/// Index of a node inside its [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Element payload: tag, attributes in source order, live form value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub value: Option<String>,
}

impl ElementData {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            attrs: Vec::new(),
            value: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_lowercase(), value)),
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn class_contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.attr("class")
            .map(|class| class.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }

    fn display_none(&self) -> bool {
        if self.has_attr("hidden") {
            return true;
        }
        if self.tag == "input" && self.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        {
            return true;
        }
        self.attr("style").is_some_and(|style| {
            style.split(';').any(|decl| {
                let mut parts = decl.splitn(2, ':');
                let prop = parts.next().unwrap_or("").trim();
                let value = parts.next().unwrap_or("").trim();
                prop.eq_ignore_ascii_case("display")
                    && value
                        .trim_end_matches("!important")
                        .trim()
                        .eq_ignore_ascii_case("none")
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// The rendered page as seen by the bridge
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    title: String,
    focused: Option<NodeId>,
    events: Vec<DomEvent>,
    scrolls: Vec<ScrollRecord>,
}

impl Document {
    /// Empty document whose root is a `body` element.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Element(ElementData::new("body")),
            }],
            title: title.into(),
            focused: None,
            events: Vec::new(),
            scrolls: Vec::new(),
        }
    }

    /// Build a document whose root element is `root`.
    pub fn from_spec(title: impl Into<String>, root: &ElementSpec) -> Self {
        let mut doc = Self::new(title);
        doc.nodes[0].data = NodeData::Element(root.to_element_data());
        doc.append_children(NodeId(0), root);
        doc
    }

    fn append_children(&mut self, parent: NodeId, spec: &ElementSpec) {
        if let Some(text) = &spec.text {
            self.append_text(parent, text.clone());
        }
        for child in &spec.children {
            match child {
                NodeSpec::Text(text) => {
                    self.append_text(parent, text.clone());
                }
                NodeSpec::Element(child) => {
                    let id = self.append_element(parent, child.to_element_data());
                    self.append_children(id, child);
                }
            }
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn append_element(&mut self, parent: NodeId, data: ElementData) -> NodeId {
        self.push(parent, NodeData::Element(data))
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(parent, NodeData::Text(text.into()))
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).map(|node| &node.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.element(next).is_some() {
                out.push(next);
                stack.extend(self.children(next).iter().rev().copied());
            }
        }
        out
    }

    /// Every element in document order, root included.
    pub fn elements(&self) -> Vec<NodeId> {
        let root = self.root();
        let mut out = vec![root];
        out.extend(self.descendants(root));
        out
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the element participates in layout: neither it nor any
    /// ancestor is `hidden`, `display: none` or a hidden input.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.element(node) {
                Some(element) if element.display_none() => return false,
                Some(_) => {}
                None if node == id => return false,
                None => {}
            }
            current = self.parent(node);
        }
        true
    }

    /// Raw concatenation of descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element(_)) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Text with whitespace runs collapsed and trimmed. Element boundaries
    /// separate words, so sibling blocks never run together.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_rendered_text(id, &mut out);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_rendered_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element(_)) => {
                out.push(' ');
                for child in self.children(id) {
                    self.collect_rendered_text(*child, out);
                }
                out.push(' ');
            }
            None => {}
        }
    }

    /// Best human label: visible text, then aria-label, title, id, tag.
    pub fn label(&self, id: NodeId) -> String {
        let text = self.inner_text(id);
        if !text.is_empty() {
            return text;
        }
        let Some(element) = self.element(id) else {
            return String::new();
        };
        ["aria-label", "title", "placeholder", "name", "id"]
            .iter()
            .filter_map(|name| element.attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| element.tag.clone())
    }

    /// Compact selector-like description for logs, e.g. `button#save.primary`.
    pub fn describe(&self, id: NodeId) -> String {
        let Some(element) = self.element(id) else {
            return format!("#text({})", id.0);
        };
        let mut out = element.tag.clone();
        if let Some(dom_id) = element.attr("id") {
            out.push('#');
            out.push_str(dom_id);
        }
        for class in element.classes().take(3) {
            out.push('.');
            out.push_str(class);
        }
        out
    }

    pub fn get_element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|id| self.attr(*id, "id") == Some(dom_id))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self.select(&list, None))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Matches of `selector` among the descendants of `scope`.
    pub fn query_selector_all_within(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let list = parse_selector(selector)?;
        Ok(self.select(&list, Some(scope)))
    }

    pub fn select(&self, list: &SelectorList, scope: Option<NodeId>) -> Vec<NodeId> {
        let candidates = match scope {
            Some(scope) => self.descendants(scope),
            None => self.elements(),
        };
        candidates
            .into_iter()
            .filter(|id| list.matches(self, *id))
            .collect()
    }

    /// Current form value: the live value, else the `value` attribute, else
    /// the text of a textarea.
    pub fn value(&self, id: NodeId) -> Option<String> {
        let element = self.element(id)?;
        if let Some(value) = &element.value {
            return Some(value.clone());
        }
        if let Some(value) = element.attr("value") {
            return Some(value.to_string());
        }
        (element.tag == "textarea").then(|| self.text_content(id))
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.value = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        let detached = std::mem::take(&mut self.nodes[id.0].children);
        for child in detached {
            if let Some(node) = self.nodes.get_mut(child.0) {
                node.parent = None;
            }
        }
        self.append_text(id, text);
        true
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Move focus, emitting `blur` on the previous element and `focus` on the new one.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        if self.focused == Some(id) {
            return true;
        }
        if let Some(previous) = self.focused.take() {
            self.dispatch(previous, EventKind::Blur);
        }
        self.focused = Some(id);
        self.dispatch(id, EventKind::Focus);
        true
    }

    pub fn scroll_into_view(&mut self, id: NodeId, behavior: ScrollBehavior, block: ScrollBlock) {
        self.scrolls.push(ScrollRecord {
            target: id,
            behavior,
            block,
        });
    }

    pub fn dispatch(&mut self, target: NodeId, kind: EventKind) {
        self.events.push(DomEvent { target, kind });
    }

    /// Native activation: a single `click` delivered to the element.
    pub fn activate(&mut self, id: NodeId) {
        self.dispatch(id, EventKind::Click);
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    pub fn event_count(&self, target: NodeId, kind: EventKind) -> usize {
        self.events
            .iter()
            .filter(|event| event.target == target && event.kind == kind)
            .count()
    }

    pub fn scrolls(&self) -> &[ScrollRecord] {
        &self.scrolls
    }

    pub fn clear_log(&mut self) {
        self.events.clear();
        self.scrolls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::el;

    fn page() -> Document {
        Document::from_spec(
            "Reports",
            &el("body")
                .child(
                    el("section")
                        .attr("style", "color: red; display : none !important")
                        .child(el("button").id("ghost").text("Ghost")),
                )
                .child(el("div").attr("hidden", "").child(el("a").id("gone").text("x")))
                .child(el("input").id("token").attr("type", "hidden"))
                .child(
                    el("button")
                        .id("save")
                        .class("btn primary")
                        .text("  Save\n   changes "),
                )
                .child(el("textarea").id("notes").text("draft")),
        )
    }

    #[test]
    fn visibility_follows_ancestors() {
        let doc = page();
        let ghost = doc.get_element_by_id("ghost").unwrap();
        let gone = doc.get_element_by_id("gone").unwrap();
        let token = doc.get_element_by_id("token").unwrap();
        let save = doc.get_element_by_id("save").unwrap();
        assert!(!doc.is_rendered(ghost));
        assert!(!doc.is_rendered(gone));
        assert!(!doc.is_rendered(token));
        assert!(doc.is_rendered(save));
    }

    #[test]
    fn text_and_labels() {
        let doc = page();
        let save = doc.get_element_by_id("save").unwrap();
        assert_eq!(doc.inner_text(save), "Save changes");
        assert_eq!(doc.label(save), "Save changes");
        assert_eq!(doc.describe(save), "button#save.btn.primary");
        let token = doc.get_element_by_id("token").unwrap();
        assert_eq!(doc.label(token), "token");
    }

    #[test]
    fn inner_text_separates_sibling_elements() {
        let doc = Document::from_spec(
            "",
            &el("div")
                .class("report-card")
                .child(el("h3").text("Sales summary"))
                .child(el("span").text("November 2, 2025"))
                .child(el("button").text("View Report")),
        );
        assert_eq!(
            doc.inner_text(doc.root()),
            "Sales summary November 2, 2025 View Report"
        );
        assert_eq!(
            doc.text_content(doc.root()),
            "Sales summaryNovember 2, 2025View Report"
        );
    }

    #[test]
    fn values_and_focus() {
        let mut doc = page();
        let notes = doc.get_element_by_id("notes").unwrap();
        let save = doc.get_element_by_id("save").unwrap();
        assert_eq!(doc.value(notes).as_deref(), Some("draft"));
        assert!(doc.set_value(notes, "final"));
        assert_eq!(doc.value(notes).as_deref(), Some("final"));

        let save_text = doc.children(save)[0];
        assert!(doc.set_text(save, "Saved"));
        assert_eq!(doc.inner_text(save), "Saved");
        assert_eq!(doc.parent(save_text), None);

        assert!(doc.focus(notes));
        assert!(doc.focus(save));
        assert_eq!(doc.focused(), Some(save));
        assert_eq!(doc.event_count(notes, EventKind::Blur), 1);
        assert_eq!(doc.event_count(save, EventKind::Focus), 1);
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = page();
        let tags: Vec<_> = doc
            .elements()
            .into_iter()
            .filter_map(|id| doc.tag(id).map(str::to_string))
            .collect();
        assert_eq!(
            tags,
            vec!["body", "section", "button", "div", "a", "input", "button", "textarea"]
        );
    }
}
