use std::collections::HashMap;

/// One lead row: column name -> raw cell text. An absent column and a blank
/// cell are treated the same everywhere downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from (column, value) pairs. Mostly useful in tests and
    /// when assembling output rows column by column.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column, value);
        }
        record
    }

    /// Raw cell text, `""` when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn get_trimmed(&self, column: &str) -> &str {
        self.get(column).trim()
    }

    pub fn is_blank(&self, column: &str) -> bool {
        self.get_trimmed(column).is_empty()
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn remove(&mut self, column: &str) {
        self.fields.remove(column);
    }
}

/// An in-memory batch of records plus the column order they were read in.
/// Derived columns are appended to `columns` in the order they are created so
/// that output stays reproducible across runs.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Register a column without touching any cell values. Existing cells in
    /// that column survive; this only makes the column part of the output.
    pub fn ensure_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    pub fn drop_columns(&mut self, names: &[&str]) {
        self.columns.retain(|c| !names.contains(&c.as_str()));
        for record in &mut self.records {
            for name in names {
                record.remove(name);
            }
        }
    }

    /// Split into (kept, dropped) by a per-row mask. Both halves keep the
    /// full column list.
    pub fn partition(self, mask: &[bool]) -> (RecordSet, RecordSet) {
        let mut kept = RecordSet::new(self.columns.clone());
        let mut dropped = RecordSet::new(self.columns);
        for (record, keep) in self.records.into_iter().zip(mask.iter()) {
            if *keep {
                kept.records.push(record);
            } else {
                dropped.records.push(record);
            }
        }
        (kept, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_absent_are_equivalent() {
        let record = Record::from_pairs([("A", "  "), ("B", "x")]);
        assert!(record.is_blank("A"));
        assert!(record.is_blank("Missing"));
        assert!(!record.is_blank("B"));
        assert_eq!(record.get("Missing"), "");
    }

    #[test]
    fn test_ensure_column_keeps_existing_values() {
        let mut set = RecordSet::new(vec!["A".to_string()]);
        set.records.push(Record::from_pairs([("A", "1"), ("review_keep", "x")]));
        set.ensure_column("review_keep");
        set.ensure_column("review_keep");
        assert_eq!(
            set.columns,
            vec!["A".to_string(), "review_keep".to_string()]
        );
        assert_eq!(set.records[0].get("review_keep"), "x");
    }

    #[test]
    fn test_partition_splits_by_mask() {
        let mut set = RecordSet::new(vec!["A".to_string()]);
        for v in ["1", "2", "3"] {
            set.records.push(Record::from_pairs([("A", v)]));
        }
        let (kept, dropped) = set.partition(&[true, false, true]);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped.records[0].get("A"), "2");
    }

    #[test]
    fn test_drop_columns_removes_values() {
        let mut set = RecordSet::new(vec!["A".to_string(), "dedupe_key".to_string()]);
        set.records.push(Record::from_pairs([("A", "1"), ("dedupe_key", "k")]));
        set.drop_columns(&["dedupe_key"]);
        assert_eq!(set.columns, vec!["A".to_string()]);
        assert_eq!(set.records[0].get("dedupe_key"), "");
    }
}
