//! Output module for progress logging and run reports
//!
//! This module handles:
//! - Mirroring counted users into an append-only progress log
//! - Printing a plain-text summary of a run
//! - Writing the markdown report and the sentiment export

mod markdown;
mod progress_log;
mod sentiment;
pub mod summary;
mod traits;

pub use markdown::{format_report, write_report};
pub use progress_log::FileProgressLog;
pub use sentiment::write_sentiment_csv;
pub use summary::{format_summary, print_summary};
pub use traits::{NullSink, OutputError, OutputResult, ProgressSink};
