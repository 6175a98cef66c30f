//! Debug document inspector.
//!
//! Backs the two linked list views: the top-level keys of the latest JSON
//! document received, and the flattened detail rows of the selected key.

use crate::error::{Error, Result};
use crate::flatten::{display_value, flatten_sorted, parse_line};
use serde::Serialize;
use serde_json::{Map, Value};

/// One key/value row of the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub key: String,
    pub value: String,
}

impl DetailRow {
    fn new(key: impl Into<String>, value: &Value) -> Self {
        Self { key: key.into(), value: display_value(value) }
    }
}

/// Latest debug document plus the user's selection in it.
#[derive(Debug, Default)]
pub struct DebugInspector {
    document: Map<String, Value>,
    items: Vec<String>,
    selected: usize,
}

impl DebugInspector {
    /// An inspector with no document yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the document with the JSON object on `line`.
    ///
    /// Lines that are not JSON objects leave the current document untouched.
    /// The selected position survives the update, clamped to the new list.
    pub fn ingest(&mut self, line: &str) -> Result<()> {
        let document = match parse_line(line)? {
            Value::Object(document) => document,
            _ => return Err(Error::MalformedJson(serde::de::Error::custom("expected a JSON object"))),
        };

        let mut items: Vec<String> = document.keys().cloned().collect();
        items.sort();
        self.document = document;
        self.items = items;
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
        Ok(())
    }

    /// Top-level keys, sorted.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// True until a document with at least one key arrives.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Select the item at `index`; out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }

    /// Position of the selected item, `None` while the list is empty.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.selected)
    }

    /// Key of the selected item.
    pub fn selected_key(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    /// Detail rows of the selected item.
    pub fn selected_detail(&self) -> Vec<DetailRow> {
        self.selected_key().map(|key| self.detail(key)).unwrap_or_default()
    }

    /// Detail rows for `key`: flattened and sorted for objects, one row for
    /// anything else.
    pub fn detail(&self, key: &str) -> Vec<DetailRow> {
        match self.document.get(key) {
            Some(value @ Value::Object(_)) => {
                flatten_sorted(value).into_iter().map(|(k, v)| DetailRow::new(k, &v)).collect()
            }
            Some(value) => vec![DetailRow::new(key, value)],
            None => Vec::new(),
        }
    }
}
