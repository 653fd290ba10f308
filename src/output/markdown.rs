//! Markdown report generation
//!
//! This module generates a human-readable markdown report of a run,
//! including run metadata, crawl counters and the full brand table.

use crate::brand::Classifier;
use crate::crawler::CrawlReport;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report of a run
///
/// # Arguments
///
/// * `report` - The finished run
/// * `classifier` - Decides which labels count as known brands
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_report(
    report: &CrawlReport,
    classifier: &dyn Classifier,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_report(report, classifier);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run as markdown
pub fn format_report(report: &CrawlReport, classifier: &dyn Classifier) -> String {
    let snapshot = &report.snapshot;
    let mut md = String::new();

    // Title
    md.push_str(&format!(
        "# Commenter Census: {}\n\n",
        report.author_id
    ));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        report.started_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Finished**: {}\n",
        report.finished_at.to_rfc3339()
    ));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.duration().as_secs()
    ));
    md.push_str(&format!("- **Stopped**: {}\n", report.stop_reason));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Crawl counters
    md.push_str("## Crawl Statistics\n\n");
    md.push_str(&format!(
        "- **Post Pages Fetched**: {}\n",
        report.post_pages_fetched
    ));
    md.push_str(&format!("- **Posts Walked**: {}\n", report.posts_walked));
    md.push_str(&format!(
        "- **Comment Pages Fetched**: {}\n",
        report.comment_pages_fetched
    ));
    md.push_str(&format!(
        "- **Comment Streams Abandoned**: {}\n",
        report.comment_stream_failures
    ));
    md.push_str(&format!("- **Unique Commenters**: {}\n", report.users_seen));
    md.push_str(&format!("- **Counted**: {}\n", snapshot.total()));
    md.push_str(&format!(
        "- **Unresolved**: {}\n\n",
        report.resolution_failures
    ));

    // Brand table
    md.push_str("## Brands\n\n");
    if snapshot.is_empty() {
        md.push_str("No users were counted.\n\n");
    } else {
        md.push_str("| Rank | Brand | Users | Share | Known |\n");
        md.push_str("|------|-------|-------|-------|-------|\n");
        for (rank, bucket) in snapshot.ranked().iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% | {} |\n",
                rank + 1,
                bucket.label,
                bucket.count,
                snapshot.share(bucket.count),
                if classifier.is_known(&bucket.label) {
                    "yes"
                } else {
                    "no"
                }
            ));
        }
        md.push('\n');
    }

    // Sentiment overview
    if !report.enrichment_results.is_empty() {
        md.push_str("## Sentiment\n\n");
        md.push_str(&format!(
            "{} comments classified.\n\n",
            report.enrichment_results.len()
        ));

        let mut by_value = std::collections::BTreeMap::new();
        for result in &report.enrichment_results {
            *by_value.entry(result.sentiment_value).or_insert(0u64) += 1;
        }

        md.push_str("| Value | Comments |\n");
        md.push_str("|-------|----------|\n");
        for (value, count) in by_value {
            md.push_str(&format!("| {} | {} |\n", value, count));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by Commenter-Census v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::BrandTable;
    use crate::crawler::StopReason;
    use crate::enrich::EnrichmentResult;
    use crate::stats::StatsSnapshot;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_report() -> CrawlReport {
        let mut counts = BTreeMap::new();
        counts.insert("Apple".to_string(), 3);
        counts.insert("unknown".to_string(), 1);

        CrawlReport {
            author_id: "1000".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            stop_reason: StopReason::Exhausted,
            snapshot: StatsSnapshot::new(counts, 4),
            users_seen: 5,
            resolution_failures: 1,
            post_pages_fetched: 2,
            posts_walked: 7,
            comment_pages_fetched: 12,
            comment_stream_failures: 0,
            config_hash: Some("abc123".to_string()),
            enrichment_results: Vec::new(),
        }
    }

    #[test]
    fn test_format_report() {
        let report = create_test_report();
        let markdown = format_report(&report, &BrandTable::default());

        assert!(markdown.contains("# Commenter Census: 1000"));
        assert!(markdown.contains("- **Config Hash**: abc123"));
        assert!(markdown.contains("- **Stopped**: no more posts"));
        assert!(markdown.contains("| 1 | Apple | 3 | 75.0% | yes |"));
        assert!(markdown.contains("| 2 | unknown | 1 | 25.0% | no |"));
        assert!(!markdown.contains("## Sentiment"));
    }

    #[test]
    fn test_format_report_with_sentiment() {
        let mut report = create_test_report();
        report.enrichment_results = vec![
            EnrichmentResult {
                user_id: "u1".to_string(),
                brand: "Apple".to_string(),
                sentiment_value: 1,
                reasoning: None,
            },
            EnrichmentResult {
                user_id: "u2".to_string(),
                brand: "Apple".to_string(),
                sentiment_value: 1,
                reasoning: None,
            },
        ];

        let markdown = format_report(&report, &BrandTable::default());
        assert!(markdown.contains("2 comments classified."));
        assert!(markdown.contains("| 1 | 2 |"));
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("summary.md");

        write_report(&create_test_report(), &BrandTable::default(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Commenter Census"));
    }
}
