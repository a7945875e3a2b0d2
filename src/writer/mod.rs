//! Writing assembled records as CSV, and JSON snapshots of loaded tables.

use crate::assemble::{AssembledRecord, FieldSet};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Writes records under a fixed header. Record fields outside the header are
/// dropped and header fields a record lacks are written empty.
pub struct TabularWriter<W: Write> {
    writer: csv::Writer<W>,
    columns: FieldSet,
    rows_written: usize,
}

impl<W: Write> TabularWriter<W> {
    pub fn new(inner: W, columns: FieldSet) -> Self {
        let writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(inner);

        Self {
            writer,
            columns,
            rows_written: 0,
        }
    }

    pub fn write_header(&mut self) -> csv::Result<()> {
        self.writer.write_record(self.columns.names())
    }

    pub fn write_record(&mut self, record: &AssembledRecord) -> csv::Result<()> {
        let row: Vec<String> = self
            .columns
            .names()
            .iter()
            .map(|name| record.get(name).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        self.writer.write_record(&row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

/// Write header plus all records to `path`.
pub fn write_csv(path: &Path, columns: &FieldSet, records: &[AssembledRecord]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = TabularWriter::new(
        BufWriter::with_capacity(WRITER_BUFFER_SIZE, file),
        columns.clone(),
    );

    writer.write_header()?;
    for record in records {
        writer.write_record(record)?;
    }

    let rows = writer.rows_written();
    writer.finish()?.flush()?;
    info!("Wrote {} records to {}", rows, path.display());
    Ok(())
}

/// Pretty-printed JSON snapshot, used for the intermediate debug files.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}
