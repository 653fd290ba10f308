//! Output traits and error types
//!
//! This module defines the progress sink interface and the error type shared
//! by every output writer.

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only mirror of counted users
///
/// Receives one `(user_id, brand)` entry per counted user, in counting order.
/// Implementations must make each entry durable before `append` returns so
/// that a crash never loses an entry that was already counted.
pub trait ProgressSink: Send {
    /// Appends one entry and flushes it to durable storage
    fn append(&mut self, user_id: &str, brand: &str) -> std::io::Result<()>;

    /// Flushes anything still buffered
    fn flush(&mut self) -> std::io::Result<()>;

    /// Discards every entry; called at the start of a fresh run
    fn reset(&mut self) -> std::io::Result<()>;
}

/// Sink that drops every entry
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn append(&mut self, _user_id: &str, _brand: &str) -> std::io::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
