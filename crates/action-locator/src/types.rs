//! Core types for locator system

use std::fmt;

use page_dom::NodeId;
use serde::{Deserialize, Serialize};

/// Element description sent by the remote agent.
///
/// Every field is optional; [`ElementQuery::plan`] turns the populated ones
/// into an ordered list of [`Locator`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ElementQuery {
    pub fn by_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn by_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn by_selector(selector: &str, index: Option<usize>) -> Self {
        Self {
            selector: Some(selector.to_string()),
            index,
            ..Default::default()
        }
    }

    pub fn by_date(date: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    /// Ordered locator plan: id, selector, text, role, name, then the date
    /// card search when `include_date` is set (click actions only).
    pub fn plan(&self, include_date: bool) -> Vec<Locator> {
        let mut plan = Vec::new();
        if let Some(id) = non_blank(&self.id) {
            plan.push(Locator::Id(id));
        }
        if let Some(selector) = non_blank(&self.selector) {
            plan.push(Locator::Selector {
                selector,
                index: self.index,
            });
        }
        if let Some(text) = non_blank(&self.text) {
            plan.push(Locator::Text(text));
        }
        if let Some(role) = non_blank(&self.role) {
            plan.push(Locator::Role {
                role,
                index: self.index,
            });
        }
        if let Some(name) = non_blank(&self.name) {
            plan.push(Locator::Name {
                name,
                index: self.index,
            });
        }
        if include_date {
            if let Some(date) = non_blank(&self.date) {
                plan.push(Locator::Date(date));
            }
        }
        plan
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// One way of finding an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Selector {
        selector: String,
        index: Option<usize>,
    },
    Text(String),
    Role {
        role: String,
        index: Option<usize>,
    },
    Name {
        name: String,
        index: Option<usize>,
    },
    Date(String),
}

impl Locator {
    pub fn strategy(&self) -> LocatorStrategy {
        match self {
            Locator::Id(_) => LocatorStrategy::Id,
            Locator::Selector { .. } => LocatorStrategy::Selector,
            Locator::Text(_) => LocatorStrategy::Text,
            Locator::Role { .. } => LocatorStrategy::Role,
            Locator::Name { .. } => LocatorStrategy::Name,
            Locator::Date(_) => LocatorStrategy::Date,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={id}"),
            Locator::Selector { selector, index } => match index {
                Some(i) => write!(f, "selector={selector}[{i}]"),
                None => write!(f, "selector={selector}"),
            },
            Locator::Text(text) => write!(f, "text={text:?}"),
            Locator::Role { role, index } => match index {
                Some(i) => write!(f, "role={role}[{i}]"),
                None => write!(f, "role={role}"),
            },
            Locator::Name { name, index } => match index {
                Some(i) => write!(f, "name={name}[{i}]"),
                None => write!(f, "name={name}"),
            },
            Locator::Date(date) => write!(f, "date={date:?}"),
        }
    }
}

/// Locator strategy enumeration, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorStrategy {
    Id,
    Selector,
    Text,
    Role,
    Name,
    Date,
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Id => "id",
            LocatorStrategy::Selector => "selector",
            LocatorStrategy::Text => "text",
            LocatorStrategy::Role => "role",
            LocatorStrategy::Name => "name",
            LocatorStrategy::Date => "date",
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![
            LocatorStrategy::Id,
            LocatorStrategy::Selector,
            LocatorStrategy::Text,
            LocatorStrategy::Role,
            LocatorStrategy::Name,
            LocatorStrategy::Date,
        ]
    }
}

/// Element candidate produced by a strategy
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: NodeId,

    /// Strategy used to find this candidate
    pub strategy: LocatorStrategy,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,
}

impl Candidate {
    pub fn new(node: NodeId, strategy: LocatorStrategy, confidence: f64) -> Self {
        Self {
            node,
            strategy,
            confidence,
        }
    }
}

/// Element resolution result
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub node: NodeId,
    pub strategy: LocatorStrategy,
    pub confidence: f64,
    /// Locator that matched
    pub locator: Locator,
}
