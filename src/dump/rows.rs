//! Decoder for the `VALUES` payload of a mysqldump insert line.
//!
//! The payload looks like `(1,'a','b\'c'),(2,'d',NULL);`. Tuples are cut
//! apart with a plain textual split on `),(`, which is not quote-aware: a
//! string value that really contains `),(` would be cut in two. mysqldump
//! output for the tables this tool reads never does that, and the split is
//! kept as is so previously accepted dumps keep producing the same rows.
//!
//! Each tuple is then split into fields by a CSV reader with `'` as the quote
//! character, after escaped quotes have been swapped for placeholders.

use super::table::{TableData, TableIndex, TableRow};
use super::DumpError;
use crate::escape::Placeholders;
use std::sync::Arc;

const TUPLE_SEPARATOR: &str = "),(";

/// Tabs are a dump formatting artifact; they are widened to four spaces.
const TAB_REPLACEMENT: &str = "    ";

/// Strip the framing of the first and last tuple and split the payload into
/// one string per tuple.
pub fn split_tuples(payload: &str) -> Vec<&str> {
    let mut body = payload.trim_end();
    body = body.strip_suffix(';').unwrap_or(body);
    body = body.strip_suffix(')').unwrap_or(body);
    body = body.strip_prefix('(').unwrap_or(body);

    body.split(TUPLE_SEPARATOR).collect()
}

pub struct RowDecoder<'a> {
    table: &'a str,
    columns: Arc<[String]>,
    placeholders: &'a Placeholders,
}

impl<'a> RowDecoder<'a> {
    pub fn new(table: &'a str, columns: &[String], placeholders: &'a Placeholders) -> Self {
        Self {
            table,
            columns: columns.iter().cloned().collect(),
            placeholders,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Decode one tuple (without its surrounding parentheses).
    pub fn decode_tuple(&self, tuple: &str) -> Result<TableRow, DumpError> {
        let normalized = tuple.replace('\t', TAB_REPLACEMENT);
        let protected = self.placeholders.protect(&normalized);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote(b'\'')
            .from_reader(protected.as_bytes());

        let csv_err = |source| DumpError::Csv {
            table: self.table.to_string(),
            source,
        };

        let mut record = csv::StringRecord::new();
        let has_record = reader.read_record(&mut record).map_err(csv_err)?;

        // An unquoted line break would start a second record
        let mut rest = csv::StringRecord::new();
        if has_record && reader.read_record(&mut rest).map_err(csv_err)? {
            return Err(DumpError::UnterminatedTuple {
                table: self.table.to_string(),
                tuple: tuple.to_string(),
            });
        }

        let values: Vec<String> = if has_record {
            record.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        if values.len() > self.columns.len() {
            return Err(DumpError::TooManyFields {
                table: self.table.to_string(),
                expected: self.columns.len(),
                found: values.len(),
                tuple: tuple.to_string(),
            });
        }

        Ok(TableRow::new(self.columns.clone(), values))
    }

    /// Decode every tuple of the payload, in dump order.
    pub fn decode_rows(&self, payload: &str) -> Result<Vec<TableRow>, DumpError> {
        split_tuples(payload)
            .into_iter()
            .map(|tuple| self.decode_tuple(tuple))
            .collect()
    }

    /// Decode every tuple and key the rows by `index_column`. A later row
    /// replaces an earlier one with the same key.
    pub fn decode_index(&self, payload: &str, index_column: &str) -> Result<TableIndex, DumpError> {
        let pos = self
            .columns
            .iter()
            .position(|c| c == index_column)
            .ok_or_else(|| DumpError::UnknownIndexColumn {
                table: self.table.to_string(),
                column: index_column.to_string(),
            })?;

        let mut index = TableIndex::new();
        for tuple in split_tuples(payload) {
            let row = self.decode_tuple(tuple)?;
            let key = row
                .values()
                .get(pos)
                .cloned()
                .ok_or_else(|| DumpError::MissingIndexValue {
                    table: self.table.to_string(),
                    column: index_column.to_string(),
                    tuple: tuple.to_string(),
                })?;
            index.insert(key, row);
        }

        Ok(index)
    }

    pub fn decode(&self, payload: &str, index_column: Option<&str>) -> Result<TableData, DumpError> {
        match index_column {
            Some(column) => self.decode_index(payload, column).map(TableData::Indexed),
            None => self.decode_rows(payload).map(TableData::Rows),
        }
    }
}
