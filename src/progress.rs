//! Progress reporting while scanning dumps.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving the number of on-disk bytes read so far.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Reader wrapper that reports the running byte count after every read.
pub struct ProgressReader<R: Read> {
    reader: R,
    callback: ProgressFn,
    bytes_read: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(reader: R, callback: ProgressFn) -> Self {
        Self {
            reader,
            callback,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}

/// Spinner shown while one table is located and decoded.
pub fn table_spinner(table: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Scanning for `{}`...", table));
    pb
}

/// Progress callback that updates a spinner's message with bytes scanned.
pub fn spinner_callback(pb: &ProgressBar, table: &str) -> ProgressFn {
    let pb = pb.clone();
    let table = table.to_string();
    Arc::new(move |bytes| {
        pb.set_message(format!(
            "Scanning for `{}`... {:.2} MB",
            table,
            bytes as f64 / (1024.0 * 1024.0)
        ));
    })
}
