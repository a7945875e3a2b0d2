//! Recovering table rows from a mysqldump without a SQL engine.
//!
//! Loading a table is three steps:
//! - [`locator`] streams the dump and finds the `CREATE TABLE` block (column
//!   names) and the `INSERT INTO ... VALUES` line (raw payload)
//! - [`rows`] splits the payload into tuples and tuples into fields
//! - the rows come back as a list, or keyed by an index column

pub mod locator;
pub mod rows;
pub mod source;
pub mod table;

pub use locator::{locate, LocatedTable, LocatorState, TableLocator};
pub use rows::{split_tuples, RowDecoder};
pub use source::{open_dump, Compression};
pub use table::{SortedIndex, TableData, TableIndex, TableRow};

use crate::escape::Placeholders;
use crate::progress::ProgressFn;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("table '{table}' not found in {}", .path.display())]
    TableNotFound { table: String, path: PathBuf },

    #[error("could not find the end of the column list for table '{table}' in {}", .path.display())]
    FieldsNotClosed { table: String, path: PathBuf },

    #[error("could not find the INSERT statement for table '{table}' in {}", .path.display())]
    InsertNotFound { table: String, path: PathBuf },

    #[error("tuple has {found} values but table '{table}' declares {expected} columns: ({tuple})")]
    TooManyFields {
        table: String,
        expected: usize,
        found: usize,
        tuple: String,
    },

    #[error("tuple in table '{table}' continues past a line break outside quotes: ({tuple})")]
    UnterminatedTuple { table: String, tuple: String },

    #[error("index column '{column}' is not a column of table '{table}'")]
    UnknownIndexColumn { table: String, column: String },

    #[error("tuple in table '{table}' has no value for index column '{column}': ({tuple})")]
    MissingIndexValue {
        table: String,
        column: String,
        tuple: String,
    },

    #[error("failed to split a tuple of table '{table}': {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DumpError {
    /// Map the state a locator was left in at end of input to a diagnosis.
    pub fn from_incomplete(state: LocatorState, table: &str, path: &Path) -> Self {
        let table = table.to_string();
        let path = path.to_path_buf();
        match state {
            LocatorState::SeekingTable => DumpError::TableNotFound { table, path },
            LocatorState::CollectingFields => DumpError::FieldsNotClosed { table, path },
            LocatorState::SeekingData | LocatorState::Complete => {
                DumpError::InsertNotFound { table, path }
            }
        }
    }

    /// Whether the dump lacks the expected schema or data, as opposed to
    /// containing it in an inconsistent form.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DumpError::TableNotFound { .. }
                | DumpError::FieldsNotClosed { .. }
                | DumpError::InsertNotFound { .. }
        )
    }
}

/// Loads tables out of one dump file. Every load rescans the file from the
/// start, so tables may appear in any order.
pub struct TableLoader<'a> {
    path: PathBuf,
    placeholders: &'a Placeholders,
    progress_fn: Option<ProgressFn>,
}

impl<'a> TableLoader<'a> {
    pub fn new(path: impl Into<PathBuf>, placeholders: &'a Placeholders) -> Self {
        Self {
            path: path.into(),
            placeholders,
            progress_fn: None,
        }
    }

    pub fn with_progress(mut self, f: ProgressFn) -> Self {
        self.progress_fn = Some(f);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the table's schema and insert line.
    pub fn locate(&self, table: &str) -> Result<LocatedTable, DumpError> {
        let io_err = |source| DumpError::Io {
            path: self.path.clone(),
            source,
        };

        let mut reader = open_dump(&self.path, self.progress_fn.clone()).map_err(io_err)?;
        let mut locator = TableLocator::new(table);
        let mut buf = Vec::new();

        while let Some(line) = source::read_line(&mut *reader, &mut buf).map_err(io_err)? {
            if locator.feed(&line) == LocatorState::Complete {
                break;
            }
        }

        locator
            .finish()
            .map_err(|state| DumpError::from_incomplete(state, table, &self.path))
    }

    pub fn load(&self, table: &str, index_column: Option<&str>) -> Result<TableData, DumpError> {
        let located = self.locate(table)?;
        let decoder = RowDecoder::new(table, &located.columns, self.placeholders);
        let data = decoder.decode(&located.payload, index_column)?;
        info!("Loaded {} rows from {}", data.len(), table);
        Ok(data)
    }

    pub fn load_rows(&self, table: &str) -> Result<Vec<TableRow>, DumpError> {
        let located = self.locate(table)?;
        let decoder = RowDecoder::new(table, &located.columns, self.placeholders);
        let rows = decoder.decode_rows(&located.payload)?;
        info!("Loaded {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    pub fn load_index(&self, table: &str, index_column: &str) -> Result<TableIndex, DumpError> {
        let located = self.locate(table)?;
        let decoder = RowDecoder::new(table, &located.columns, self.placeholders);
        let index = decoder.decode_index(&located.payload, index_column)?;
        debug!("Indexed {} by {}", table, index_column);
        info!("Loaded {} rows from {}", index.len(), table);
        Ok(index)
    }
}

/// Load one table from a dump file.
pub fn load_table(
    path: &Path,
    table: &str,
    index_column: Option<&str>,
    placeholders: &Placeholders,
) -> Result<TableData, DumpError> {
    TableLoader::new(path, placeholders).load(table, index_column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_incomplete_maps_states() {
        let path = Path::new("dump.sql");
        assert!(matches!(
            DumpError::from_incomplete(LocatorState::SeekingTable, "user", path),
            DumpError::TableNotFound { .. }
        ));
        assert!(matches!(
            DumpError::from_incomplete(LocatorState::CollectingFields, "user", path),
            DumpError::FieldsNotClosed { .. }
        ));
        assert!(matches!(
            DumpError::from_incomplete(LocatorState::SeekingData, "user", path),
            DumpError::InsertNotFound { .. }
        ));
    }

    #[test]
    fn test_structural_messages_name_table_and_file() {
        let err = DumpError::from_incomplete(
            LocatorState::SeekingTable,
            "passphrase_secret",
            Path::new("/tmp/phab.sql"),
        );
        assert!(err.is_structural());
        assert_eq!(
            err.to_string(),
            "table 'passphrase_secret' not found in /tmp/phab.sql"
        );
    }
}
