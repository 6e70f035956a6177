//! Serializable page fixtures and a builder for tests
//!
//! ```yaml
//! title: Reports
//! body:
//!   tag: main
//!   children:
//!     - tag: button
//!       attrs: { id: refresh }
//!       text: Refresh
//!     - "loose text"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, ElementData};

/// A full page fixture: title plus root element.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub title: String,
    pub body: ElementSpec,
}

impl PageSpec {
    pub fn to_document(&self) -> Document {
        Document::from_spec(self.title.clone(), &self.body)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Text placed before `children`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text(String),
    Element(ElementSpec),
}

/// Start building an element.
pub fn el(tag: &str) -> ElementSpec {
    ElementSpec {
        tag: tag.to_string(),
        ..Default::default()
    }
}

impl ElementSpec {
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(NodeSpec::Element(child));
        self
    }

    pub fn text_node(mut self, text: &str) -> Self {
        self.children.push(NodeSpec::Text(text.to_string()));
        self
    }

    pub(crate) fn to_element_data(&self) -> ElementData {
        let mut data = ElementData::new(self.tag.clone());
        for (name, value) in &self.attrs {
            data.set_attr(name, value.clone());
        }
        data.value = self.value.clone();
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fixture_round_trips_into_document() {
        let raw = r#"
title: Reports
body:
  tag: main
  children:
    - tag: button
      attrs: { id: refresh }
      text: Refresh
    - "loose text"
    - tag: input
      attrs: { name: q }
      value: hello
"#;
        let page: PageSpec = serde_yaml::from_str(raw).unwrap();
        let doc = page.to_document();
        assert_eq!(doc.title(), "Reports");
        assert_eq!(doc.tag(doc.root()), Some("main"));
        let refresh = doc.get_element_by_id("refresh").unwrap();
        assert_eq!(doc.inner_text(refresh), "Refresh");
        assert_eq!(doc.inner_text(doc.root()), "Refresh loose text");
        let input = doc.query_selector("input[name=q]").unwrap().unwrap();
        assert_eq!(doc.value(input).as_deref(), Some("hello"));
    }

    #[test]
    fn json_fixture_accepts_text_children() {
        let raw = r#"{"tag":"p","children":["a",{"tag":"b","text":"c"}]}"#;
        let spec: ElementSpec = serde_json::from_str(raw).unwrap();
        let doc = Document::from_spec("", &spec);
        assert_eq!(doc.text_content(doc.root()), "ac");
    }
}
