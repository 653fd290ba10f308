//! Crawler module for paging through posts and comments
//!
//! This module contains the core crawling logic, including:
//! - The remote data source seam and its HTTP implementation
//! - Pagination state and request pacing
//! - Overall crawl coordination

mod coordinator;
mod cursor;
mod fetcher;
mod http;
mod pacer;

pub use coordinator::{Coordinator, CrawlReport, CrawlSettings, ResolveError, StopReason};
pub use cursor::CrawlCursor;
pub use fetcher::{
    build_http_client, CommentPage, Commenter, FetchError, Fetcher, PostPage, PostRef,
    DEFAULT_USER_AGENT,
};
pub use http::WeiboFetcher;
pub use pacer::RequestPacer;

use crate::brand::Classifier;
use crate::config::Config;
use crate::enrich::{ChatSentimentClassifier, EnrichmentPool};
use crate::output::{write_report, write_sentiment_csv};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete census
///
/// This is the main entry point for a run. It will:
/// 1. Open the run directory and progress log
/// 2. Start the enrichment pool, if enabled
/// 3. Crawl until a stop condition or cancellation
/// 4. Drain the enrichment pool (or abandon it when cancelled)
/// 5. Write the markdown report and the sentiment export
///
/// # Arguments
///
/// * `config` - A validated configuration
/// * `config_hash` - Hash of the config file, recorded in the report
/// * `cancel` - Token that stops the run early
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished, possibly early; report files that
///   could not be written are logged, not returned as errors
/// * `Err(CensusError)` - The run could not be set up
pub async fn run_census(
    config: &Config,
    config_hash: Option<String>,
    cancel: CancellationToken,
) -> crate::Result<CrawlReport> {
    let mut coordinator = Coordinator::from_config(config)?.with_cancellation(cancel.clone());
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    let pool = if config.enrichment.enabled {
        let classifier = ChatSentimentClassifier::new(&config.enrichment)?;
        let pool = EnrichmentPool::start(
            Arc::new(classifier),
            config.enrichment.workers,
            config.enrichment.queue_capacity,
        );
        coordinator = coordinator.with_enrichment(pool.handle());
        Some(pool)
    } else {
        None
    };

    let mut report = coordinator.run().await?;

    if let Some(pool) = pool {
        let handle = pool.handle();
        if cancel.is_cancelled() {
            tracing::info!("Abandoning outstanding enrichment jobs");
            pool.abort();
        } else {
            tracing::info!("Waiting for enrichment to finish");
            pool.shutdown(config.enrichment.shutdown_timeout()).await;
        }

        if handle.dropped() > 0 || handle.failed() > 0 {
            tracing::warn!(
                "Enrichment: {} jobs dropped, {} failed",
                handle.dropped(),
                handle.failed()
            );
        }
        report.enrichment_results = handle.results();
    }

    write_outputs(config, &report, coordinator.classifier().as_ref());

    Ok(report)
}

/// Writes the markdown report and, with enrichment on, the sentiment export
///
/// Failures are logged; the counts they would have recorded are already in
/// the progress log and the returned report.
fn write_outputs(config: &Config, report: &CrawlReport, classifier: &dyn Classifier) {
    let run_dir = config.output.run_dir(&config.target.author_id);

    let summary_path = run_dir.join(&config.output.summary_file);
    match write_report(report, classifier, &summary_path) {
        Ok(()) => tracing::info!("Report written to {}", summary_path.display()),
        Err(e) => tracing::error!(
            "Failed to write report to {}: {}",
            summary_path.display(),
            e
        ),
    }

    if config.enrichment.enabled {
        let sentiment_path = run_dir.join(&config.output.sentiment_file);
        match write_sentiment_csv(&report.enrichment_results, &sentiment_path) {
            Ok(()) => tracing::info!(
                "{} sentiment results written to {}",
                report.enrichment_results.len(),
                sentiment_path.display()
            ),
            Err(e) => tracing::error!(
                "Failed to write sentiment results to {}: {}",
                sentiment_path.display(),
                e
            ),
        }
    }
}
