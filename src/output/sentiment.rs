//! Sentiment export
//!
//! Enrichment results are written as CSV with a header row, one row per
//! classified user.

use crate::enrich::EnrichmentResult;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const HEADER: &str = "user_id,brand,sentiment_value,reasoning";

/// Writes `results` to `output_path`, replacing any previous file
pub fn write_sentiment_csv(results: &[EnrichmentResult], output_path: &Path) -> OutputResult<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(output_path)?);
    writeln!(writer, "{}", HEADER)?;
    for result in results {
        writeln!(
            writer,
            "{},{},{},{}",
            escape_field(&result.user_id),
            escape_field(&result.brand),
            result.sentiment_value,
            escape_field(result.reasoning.as_deref().unwrap_or(""))
        )?;
    }
    writer.flush()?;

    Ok(())
}

/// Quotes a field if it contains a separator, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
