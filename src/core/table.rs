//! Ordered route table and the merge of loaded and registered routes.
use std::collections::HashMap;

use serde_json::Value;

use crate::core::route::{REGISTRABLE_METHODS, RouteData, RouteDefinition, RouteKey};

/// Mapping from [`RouteKey`] to [`RouteDefinition`] that remembers insertion
/// order. Pattern matching walks the entries in that order, so the first
/// declared pattern wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<(RouteKey, RouteDefinition)>,
    index: HashMap<RouteKey, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a parsed route file. Returns `None` when the
    /// document is not a JSON object.
    pub fn from_document(document: &Value) -> Option<Self> {
        let routes = document.as_object()?;
        let mut table = Self::new();
        for (key, definition) in routes {
            table.insert(
                RouteKey::from_raw(key.as_str()),
                RouteDefinition::from_value(definition),
            );
        }
        Some(table)
    }

    /// Insert or overwrite. An overwritten entry keeps its original position.
    pub fn insert(&mut self, key: RouteKey, definition: RouteDefinition) -> Option<RouteDefinition> {
        if let Some(&slot) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[slot].1, definition));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, definition));
        None
    }

    /// Add an inline route for one of [`REGISTRABLE_METHODS`] (case-insensitive).
    /// Any other method is ignored and `false` is returned.
    pub fn register(&mut self, method: &str, url: &str, data: RouteData) -> bool {
        let method = method.to_ascii_uppercase();
        if !REGISTRABLE_METHODS.contains(&method.as_str()) {
            tracing::debug!("Ignoring registration for unsupported method {}", method);
            return false;
        }
        self.insert(RouteKey::new(&method, url), RouteDefinition::Inline(data));
        true
    }

    pub fn get(&self, key: &str) -> Option<&RouteDefinition> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&RouteKey, &RouteDefinition)> {
        self.index.get(key).map(|&slot| {
            let (key, definition) = &self.entries[slot];
            (key, definition)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &RouteDefinition)> {
        self.entries.iter().map(|(key, def)| (key, def))
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// Union `registered` into `loaded`, registered entries winning on equal keys.
///
/// An unusable `loaded` table (missing or unparsable route file) is replaced
/// by an empty one as long as something was registered. With nothing to
/// serve at all, `None` is returned and the caller answers with the route
/// file error.
pub fn merge_routes(loaded: Option<RouteTable>, registered: &RouteTable) -> Option<RouteTable> {
    let mut table = match loaded {
        Some(table) => table,
        None if !registered.is_empty() => RouteTable::new(),
        None => return None,
    };

    for (key, definition) in registered.iter() {
        table.insert(key.clone(), definition.clone());
    }
    Some(table)
}
