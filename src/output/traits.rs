//! Record sink trait and error types
//!
//! A sink is the durable destination of finished book records. The crawl
//! coordinator is its only writer, so implementations never see
//! concurrent calls.

use crate::output::book::Book;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Sink already finished; no further records accepted")]
    Finished,

    #[error(
        "No book collection at {}. Run the crawl first (`bookcrawl`) to create it.",
        .path.display()
    )]
    MissingCollection { path: PathBuf },

    #[error("Book collection at {} is not a valid JSON array of books: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for completed book records
///
/// `write` is called once per emitted record as it completes. `finish` is
/// called exactly once, after the last record or when the crawl is
/// cancelled, and must leave the output as a complete, well-formed
/// collection.
pub trait RecordSink: Send {
    /// Persists one record
    fn write(&mut self, book: &Book) -> OutputResult<()>;

    /// Closes the collection
    fn finish(&mut self) -> OutputResult<()>;
}

/// In-memory sink, mostly useful for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    books: Vec<Book>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn into_books(self) -> Vec<Book> {
        self.books
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, book: &Book) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished);
        }
        self.books.push(book.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.finished = true;
        Ok(())
    }
}
