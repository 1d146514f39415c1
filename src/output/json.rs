//! Streaming JSON array output
//!
//! Records are appended to the file as they arrive, so memory use does not
//! grow with the catalog. The closing bracket is written by `finish`; a
//! cancelled crawl still calls `finish` and leaves a valid partial array.

use crate::output::book::Book;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Writes book records as a pretty-printed JSON array
///
/// The file is created on the first write (or on `finish` for an empty
/// collection), so a crawl that fails before producing anything leaves a
/// previous collection at the same path untouched.
pub struct JsonArraySink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    written: usize,
    finished: bool,
}

impl JsonArraySink {
    /// Prepares a sink for `path`, creating parent directories
    ///
    /// # Returns
    ///
    /// * `Ok(JsonArraySink)` - Ready to accept records
    /// * `Err(OutputError)` - The parent directory could not be created
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer: None,
            written: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    fn open(&mut self) -> OutputResult<&mut BufWriter<File>> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        if self.writer.is_none() {
            let mut writer = BufWriter::new(File::create(&self.path)?);
            writer.write_all(b"[")?;
            tracing::debug!("Opened book collection at {}", self.path.display());
            self.writer = Some(writer);
        }
        self.writer.as_mut().ok_or(OutputError::Finished)
    }
}

impl RecordSink for JsonArraySink {
    fn write(&mut self, book: &Book) -> OutputResult<()> {
        let encoded = serde_json::to_string_pretty(book)?;
        let separator: &[u8] = if self.written == 0 { b"\n  " } else { b",\n  " };

        let writer = self.open()?;
        writer.write_all(separator)?;
        writer.write_all(encoded.replace('\n', "\n  ").as_bytes())?;
        writer.flush()?;

        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.open()?;
        let mut writer = self.writer.take().ok_or(OutputError::Finished)?;
        self.finished = true;

        let closing: &[u8] = if self.written == 0 { b"]\n" } else { b"\n]\n" };
        writer.write_all(closing)?;
        writer
            .into_inner()
            .map_err(|e| OutputError::Write(e.to_string()))?
            .sync_all()?;

        tracing::info!(
            "Wrote {} records to {}",
            self.written,
            self.path.display()
        );
        Ok(())
    }
}

impl Drop for JsonArraySink {
    fn drop(&mut self) {
        if self.writer.is_some() {
            if let Err(e) = self.finish() {
                tracing::error!("Failed to close {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Loads a book collection written by a crawl
///
/// A missing file is reported as [`OutputError::MissingCollection`], whose
/// message tells the operator to run the crawl first.
pub fn load_books(path: &Path) -> OutputResult<Vec<Book>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(OutputError::MissingCollection {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|source| OutputError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
