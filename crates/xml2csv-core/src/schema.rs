//! Per-conversion column state.
//!
//! The first row that captures any column fixes the header for the rest of the
//! run. Columns that only show up in later rows are never appended.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSchema {
    columns: Vec<String>,
    seen: HashSet<String>,
    frozen: bool,
}

impl RowSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column name in first-seen order. No-op once frozen.
    pub fn observe(&mut self, name: &str) {
        if self.frozen || self.seen.contains(name) {
            return;
        }
        self.seen.insert(name.to_string());
        self.columns.push(name.to_string());
    }

    /// Fix the column order permanently.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// One field per column, in header order; absent columns render empty.
    pub fn project<'a>(&'a self, row: &'a RowValues) -> impl Iterator<Item = &'a str> + 'a {
        self.columns
            .iter()
            .map(move |c| row.get(c).unwrap_or(""))
    }
}

/// Values captured for one row, keyed by child element local name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowValues {
    values: HashMap<String, String>,
}

impl RowValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value; a repeated column within one row keeps the last value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_keeps_first_seen_order() {
        let mut s = RowSchema::new();
        for name in ["title", "id", "title", "price"] {
            s.observe(name);
        }
        assert_eq!(s.columns(), ["title", "id", "price"]);
    }

    #[test]
    fn frozen_schema_ignores_new_columns() {
        let mut s = RowSchema::new();
        s.observe("a");
        s.observe("b");
        s.freeze();
        s.observe("c");
        assert!(s.is_frozen());
        assert_eq!(s.columns(), ["a", "b"]);
    }

    #[test]
    fn project_fills_missing_with_empty() {
        let mut s = RowSchema::new();
        s.observe("a");
        s.observe("b");
        s.freeze();

        let mut row = RowValues::new();
        row.set("a", "3");
        row.set("zzz", "ignored");
        let fields: Vec<&str> = s.project(&row).collect();
        assert_eq!(fields, vec!["3", ""]);
    }

    #[test]
    fn last_write_wins() {
        let mut row = RowValues::new();
        row.set("a", "first");
        row.set("a", "second");
        assert_eq!(row.get("a"), Some("second"));
        assert!(!row.is_empty());
    }
}
