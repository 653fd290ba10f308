//! Plain-text run summary
//!
//! This module renders a finished run's brand histogram for the terminal.

use crate::brand::Classifier;
use crate::crawler::CrawlReport;

/// Number of known brands listed in the summary
pub const TOP_BRANDS: usize = 5;

/// Unknown labels are listed individually only up to this many
pub const UNKNOWN_LIST_LIMIT: usize = 10;

/// Formats a run summary
///
/// # Arguments
///
/// * `report` - The finished run
/// * `classifier` - Decides which labels count as known brands
///
/// # Returns
///
/// A multi-line summary: user counts, known and unknown label counts, the
/// top known brands with their share of counted users, and the unknown
/// labels when there are few enough to list.
pub fn format_summary(report: &CrawlReport, classifier: &dyn Classifier) -> String {
    let snapshot = &report.snapshot;
    let (known, unknown) = snapshot.partition_known(classifier);
    let mut out = String::new();

    out.push_str(&format!("=== Census Summary: {} ===\n\n", report.author_id));
    out.push_str(&format!("Stopped: {}\n", report.stop_reason));
    out.push_str(&format!(
        "Duration: {:.1}s\n\n",
        report.duration().as_secs_f64()
    ));

    out.push_str("Users:\n");
    out.push_str(&format!("  Unique commenters: {}\n", report.users_seen));
    out.push_str(&format!("  Counted: {}\n", snapshot.total()));
    if report.resolution_failures > 0 {
        out.push_str(&format!("  Unresolved: {}\n", report.resolution_failures));
    }
    out.push_str(&format!("  Known brands: {}\n", known.len()));
    out.push_str(&format!("  Unknown labels: {}\n", unknown.len()));

    if !known.is_empty() {
        out.push_str(&format!("\nTop {} Known Brands:\n", TOP_BRANDS));
        for (rank, bucket) in known.iter().take(TOP_BRANDS).enumerate() {
            out.push_str(&format!(
                "  {}. {}: {} ({:.1}%)\n",
                rank + 1,
                bucket.label,
                bucket.count,
                snapshot.share(bucket.count)
            ));
        }
    }

    if !unknown.is_empty() && unknown.len() <= UNKNOWN_LIST_LIMIT {
        out.push_str("\nUnknown Labels:\n");
        for bucket in &unknown {
            out.push_str(&format!("  {}: {}\n", bucket.label, bucket.count));
        }
    }

    if !report.enrichment_results.is_empty() {
        out.push_str(&format!(
            "\nSentiment results: {}\n",
            report.enrichment_results.len()
        ));
    }

    out
}

/// Prints a run summary to stdout
pub fn print_summary(report: &CrawlReport, classifier: &dyn Classifier) {
    print!("{}", format_summary(report, classifier));
}
