//! Decoded table contents.

use ahash::AHashMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Rows keyed by the value of their index column.
pub type TableIndex = AHashMap<String, TableRow>;

/// One decoded tuple, addressed by column name.
///
/// All rows of a table share the same column list. A tuple that carried
/// fewer values than there are columns leaves the trailing columns absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl TableRow {
    /// `values` must not be longer than `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<String>) -> Self {
        debug_assert!(values.len() <= columns.len());
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        let pos = self.columns.iter().position(|c| c == column)?;
        self.values.get(pos).map(String::as_str)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Column/value pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), self.values.get(i).map(String::as_str)))
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}

/// A loaded table: either rows in dump order, or rows keyed by an index column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableData {
    Rows(Vec<TableRow>),
    Indexed(TableIndex),
}

impl TableData {
    pub fn len(&self) -> usize {
        match self {
            TableData::Rows(rows) => rows.len(),
            TableData::Indexed(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_rows(self) -> Option<Vec<TableRow>> {
        match self {
            TableData::Rows(rows) => Some(rows),
            TableData::Indexed(_) => None,
        }
    }

    pub fn into_index(self) -> Option<TableIndex> {
        match self {
            TableData::Rows(_) => None,
            TableData::Indexed(index) => Some(index),
        }
    }
}

impl Serialize for TableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TableData::Rows(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
            TableData::Indexed(index) => SortedIndex(index).serialize(serializer),
        }
    }
}

/// Borrowed view of an index that serializes with its keys sorted, so
/// snapshots are stable across runs.
pub struct SortedIndex<'a>(pub &'a TableIndex);

impl Serialize for SortedIndex<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entries: Vec<(&String, &TableRow)> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, row) in entries {
            map.serialize_entry(key, row)?;
        }
        map.end()
    }
}
