use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Static path → human label table used in navigation notices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable(BTreeMap<String, String>);

impl Default for RouteTable {
    fn default() -> Self {
        let labels = [
            ("/", "Home"),
            ("/dashboard", "Dashboard"),
            ("/reports", "Reports"),
            ("/analytics", "Analytics"),
            ("/bots", "Bot Controls"),
            ("/settings", "Settings"),
            ("/profile", "Profile"),
        ];
        Self(
            labels
                .iter()
                .map(|(path, label)| (path.to_string(), label.to_string()))
                .collect(),
        )
    }
}

impl RouteTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, path: impl Into<String>, label: impl Into<String>) {
        self.0.insert(path.into(), label.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label for `path`, ignoring query, fragment and a trailing slash; the raw
    /// path when unmapped.
    pub fn label_for(&self, path: &str) -> String {
        let bare = path.split(['?', '#']).next().unwrap_or(path);
        let bare = if bare.len() > 1 {
            bare.trim_end_matches('/')
        } else {
            bare
        };
        self.0
            .get(bare)
            .cloned()
            .unwrap_or_else(|| path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_fall_back_to_raw_path() {
        let table = RouteTable::default();
        assert_eq!(table.label_for("/bots"), "Bot Controls");
        assert_eq!(table.label_for("/reports/?tab=2"), "Reports");
        assert_eq!(table.label_for("/"), "Home");
        assert_eq!(table.label_for("/unknown/page"), "/unknown/page");
    }
}
