//! Opening dump files, with transparent decompression.

use crate::progress::{ProgressFn, ProgressReader};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Open a dump for line-by-line reading.
pub fn open_dump(path: &Path, progress: Option<ProgressFn>) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let compression = Compression::from_path(path);

    let reader: Box<dyn Read> = match progress {
        Some(cb) => Box::new(ProgressReader::new(file, cb)),
        None => Box::new(file),
    };

    let reader = compression.wrap_reader(reader)?;
    Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, reader)))
}

/// Read the next line as text, without its terminator. Invalid UTF-8 is
/// replaced rather than rejected, since only a few tables are of interest.
pub fn read_line(reader: &mut dyn BufRead, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}
