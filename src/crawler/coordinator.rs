//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives the two nested pagination
//! sequences (an author's post pages, then each post's comment pages), pushes
//! every commenter through the dedup gate, resolves the device brand of each
//! newly admitted user from their own posts, and counts them. It also:
//! - Spaces every remote request by the configured interval
//! - Enforces the global and per-post limits
//! - Hands counted users to the enrichment pool, if one is attached
//! - Observes the cancellation token around every fetch and pause

use crate::brand::{BrandTable, Classifier, UNKNOWN_DEVICE_LABEL};
use crate::config::Config;
use crate::crawler::cursor::CrawlCursor;
use crate::crawler::fetcher::{CommentPage, Commenter, FetchError, Fetcher, PostPage, PostRef};
use crate::crawler::http::WeiboFetcher;
use crate::crawler::pacer::RequestPacer;
use crate::enrich::{EnrichmentHandle, EnrichmentJob, EnrichmentResult};
use crate::output::FileProgressLog;
use crate::stats::{StatsSnapshot, Tally};
use chrono::{DateTime, Utc};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a brand could not be resolved for an admitted user
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("user {0} has no posts")]
    NoPosts(String),

    #[error("brand lookup failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("brand lookup cancelled")]
    Cancelled,
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The global limit of counted users was reached
    LimitReached,

    /// Every post (and every comment on it) has been visited
    Exhausted,

    /// A post page could not be fetched; the run ended early
    FetchFailed(String),

    /// The cancellation token fired
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::LimitReached => write!(f, "limit reached"),
            StopReason::Exhausted => write!(f, "no more posts"),
            StopReason::FetchFailed(message) => write!(f, "post page fetch failed: {}", message),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Final outcome of one run
///
/// Always produced, even when the run ended early; `snapshot` holds exactly
/// what was counted before the stop.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub author_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub snapshot: StatsSnapshot,

    /// Distinct users admitted, counted or not
    pub users_seen: usize,

    /// Admitted users whose brand could not be resolved
    pub resolution_failures: u64,

    pub post_pages_fetched: u64,
    pub posts_walked: u64,
    pub comment_pages_fetched: u64,

    /// Comment streams abandoned after a fetch error
    pub comment_stream_failures: u64,

    pub config_hash: Option<String>,

    /// Filled in once the enrichment pool has shut down
    pub enrichment_results: Vec<EnrichmentResult>,
}

impl CrawlReport {
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// The part of the configuration the crawl loop consumes
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub author_id: String,
    pub post_ids: Vec<String>,
    pub global_limit: u64,
    pub per_post_limit: Option<u64>,
    pub request_interval: Duration,
    pub brand_lookup_pages: u32,
}

impl CrawlSettings {
    /// Settings for a timeline crawl of `author_id` with default limits and
    /// no pause between requests
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            post_ids: Vec::new(),
            global_limit: 100,
            per_post_limit: None,
            request_interval: Duration::ZERO,
            brand_lookup_pages: 1,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            author_id: config.target.author_id.clone(),
            post_ids: config.target.post_ids.clone(),
            global_limit: config.crawler.global_limit,
            per_post_limit: config.crawler.per_post_limit,
            request_interval: config.crawler.request_interval(),
            brand_lookup_pages: config.crawler.brand_lookup_pages,
        }
    }
}

#[derive(Debug, Default)]
struct RunCounters {
    post_pages_fetched: u64,
    posts_walked: u64,
    comment_pages_fetched: u64,
    comment_stream_failures: u64,
    resolution_failures: u64,
}

/// What happened to one commenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Duplicate,
    Counted,
    Unresolved,
    Cancelled,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<dyn Classifier>,
    tally: Arc<Tally>,
    enrichment: Option<EnrichmentHandle>,
    pacer: RequestPacer,
    cancel: CancellationToken,
    config_hash: Option<String>,
    counters: RunCounters,
}

impl Coordinator {
    /// Creates a coordinator from explicit collaborators
    pub fn new(
        settings: CrawlSettings,
        fetcher: Arc<dyn Fetcher>,
        classifier: Arc<dyn Classifier>,
        tally: Arc<Tally>,
    ) -> Self {
        let pacer = RequestPacer::new(settings.request_interval);
        Self {
            settings,
            fetcher,
            classifier,
            tally,
            enrichment: None,
            pacer,
            cancel: CancellationToken::new(),
            config_hash: None,
            counters: RunCounters::default(),
        }
    }

    /// Creates a coordinator wired to the HTTP fetcher, the default brand
    /// table and a progress log inside the run directory
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CensusError)` - The run directory, progress log or HTTP client
    ///   could not be set up
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let run_dir = config.output.run_dir(&config.target.author_id);
        std::fs::create_dir_all(&run_dir)?;

        let progress_log = FileProgressLog::create(&run_dir.join(&config.output.progress_file))?;
        let fetcher = WeiboFetcher::new(&config.client)?;

        Ok(Self::new(
            CrawlSettings::from_config(config),
            Arc::new(fetcher),
            Arc::new(BrandTable::default()),
            Arc::new(Tally::new(Box::new(progress_log))),
        ))
    }

    /// Submits every counted user to `handle`
    pub fn with_enrichment(mut self, handle: EnrichmentHandle) -> Self {
        self.enrichment = Some(handle);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// The live tally; snapshots may be taken while the run is in progress
    pub fn tally(&self) -> Arc<Tally> {
        Arc::clone(&self.tally)
    }

    pub fn classifier(&self) -> Arc<dyn Classifier> {
        Arc::clone(&self.classifier)
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Runs one census from a clean slate
    ///
    /// The tally and progress log are reset first. Post-page failures end
    /// the run but still yield a report; only a failure to reset the
    /// progress log is returned as an error.
    pub async fn run(&mut self) -> crate::Result<CrawlReport> {
        let started_at = Utc::now();
        self.tally.reset()?;
        self.counters = RunCounters::default();

        tracing::info!(
            "Starting census of author {} (limit {}, interval {:?})",
            self.settings.author_id,
            self.settings.global_limit,
            self.settings.request_interval
        );

        let stop_reason = if self.settings.post_ids.is_empty() {
            self.crawl_timeline().await
        } else {
            self.crawl_listed_posts().await
        };

        if let Err(e) = self.tally.flush() {
            tracing::warn!("Failed to flush progress log: {}", e);
        }

        let snapshot = self.tally.snapshot();
        let finished_at = Utc::now();

        tracing::info!(
            "Census finished ({}): {} users counted, {} seen, {} unresolved",
            stop_reason,
            snapshot.total(),
            self.tally.seen_count(),
            self.counters.resolution_failures
        );

        Ok(CrawlReport {
            author_id: self.settings.author_id.clone(),
            started_at,
            finished_at,
            stop_reason,
            snapshot,
            users_seen: self.tally.seen_count(),
            resolution_failures: self.counters.resolution_failures,
            post_pages_fetched: self.counters.post_pages_fetched,
            posts_walked: self.counters.posts_walked,
            comment_pages_fetched: self.counters.comment_pages_fetched,
            comment_stream_failures: self.counters.comment_stream_failures,
            config_hash: self.config_hash.clone(),
            enrichment_results: Vec::new(),
        })
    }

    /// Pages through the author's timeline until a stop condition
    async fn crawl_timeline(&mut self) -> StopReason {
        let author_id = self.settings.author_id.clone();
        let mut cursor = CrawlCursor::new();

        loop {
            if self.limit_reached() {
                return StopReason::LimitReached;
            }

            let page_number = cursor.page_number();
            let posts = match self.fetch_posts(&author_id, page_number).await {
                None => return StopReason::Cancelled,
                Some(Ok(PostPage::Posts(posts))) if !posts.is_empty() => posts,
                Some(Ok(_)) => {
                    tracing::info!("No more posts after page {}", page_number - 1);
                    return StopReason::Exhausted;
                }
                Some(Err(e)) => {
                    tracing::error!("Failed to fetch post page {}: {}", page_number, e);
                    return StopReason::FetchFailed(e.to_string());
                }
            };

            self.counters.post_pages_fetched += 1;
            tracing::debug!("Post page {}: {} posts", page_number, posts.len());

            for post in posts.iter().filter(|post| post.author_id == author_id) {
                if let ControlFlow::Break(reason) = self.walk_post(post, &mut cursor, true).await {
                    return reason;
                }
            }

            cursor.advance_page();
        }
    }

    /// Walks only the configured posts
    ///
    /// With enrichment attached, each post's body is looked up first so the
    /// classifier sees the post a comment answers. A post whose body cannot
    /// be loaded is still walked, but its commenters are not enriched.
    async fn crawl_listed_posts(&mut self) -> StopReason {
        let post_ids = self.settings.post_ids.clone();
        let mut cursor = CrawlCursor::new();

        for post_id in &post_ids {
            if self.limit_reached() {
                return StopReason::LimitReached;
            }

            let bare = PostRef {
                id: post_id.clone(),
                author_id: self.settings.author_id.clone(),
                raw_device_source: String::new(),
                text: String::new(),
            };

            let (post, enrich) = if self.enrichment.is_none() {
                (bare, false)
            } else {
                match self.fetch_post(post_id).await {
                    None => return StopReason::Cancelled,
                    Some(Ok(found)) => {
                        let author_id = if found.author_id.is_empty() {
                            bare.author_id
                        } else {
                            found.author_id
                        };
                        let post = PostRef {
                            author_id,
                            text: found.text,
                            ..bare
                        };
                        (post, true)
                    }
                    Some(Err(e)) => {
                        tracing::warn!(
                            "Could not load post {}, its commenters will not be enriched: {}",
                            post_id,
                            e
                        );
                        (bare, false)
                    }
                }
            };

            if let ControlFlow::Break(reason) = self.walk_post(&post, &mut cursor, enrich).await {
                return reason;
            }
        }

        if self.limit_reached() {
            StopReason::LimitReached
        } else {
            StopReason::Exhausted
        }
    }

    /// Walks one post's comment stream
    ///
    /// A comment fetch error abandons only this post. Breaks with a stop
    /// reason when the global limit is hit or the run is cancelled. Counted
    /// users are submitted for enrichment only when `enrich` is set.
    async fn walk_post(
        &mut self,
        post: &PostRef,
        cursor: &mut CrawlCursor,
        enrich: bool,
    ) -> ControlFlow<StopReason> {
        self.counters.posts_walked += 1;
        cursor.begin_comments();
        let mut counted_here = 0;

        while cursor.has_more_comments() {
            if self.limit_reached() {
                return ControlFlow::Break(StopReason::LimitReached);
            }
            if self.post_limit_reached(counted_here) {
                tracing::debug!("Per-post limit reached on post {}", post.id);
                break;
            }

            let requested = cursor.continuation();
            let page = match self.fetch_comments(post, requested).await {
                None => return ControlFlow::Break(StopReason::Cancelled),
                Some(Ok(page)) => page,
                Some(Err(e)) => {
                    tracing::warn!("Skipping remaining comments on post {}: {}", post.id, e);
                    self.counters.comment_stream_failures += 1;
                    cursor.end_comments();
                    break;
                }
            };

            self.counters.comment_pages_fetched += 1;
            tracing::debug!(
                "Post {}: {} comments at cursor {}, next {}",
                post.id,
                page.commenters.len(),
                requested,
                page.next_cursor
            );

            if page.next_cursor != 0 && page.next_cursor == requested {
                tracing::warn!(
                    "Post {} returned cursor {} twice, ending its comment stream",
                    post.id,
                    requested
                );
                cursor.end_comments();
            } else {
                cursor.advance_comments(page.next_cursor);
            }

            for commenter in &page.commenters {
                if self.limit_reached() {
                    return ControlFlow::Break(StopReason::LimitReached);
                }
                if self.post_limit_reached(counted_here) {
                    break;
                }

                match self.process_commenter(commenter, post, enrich).await {
                    Admission::Counted => counted_here += 1,
                    Admission::Duplicate | Admission::Unresolved => {}
                    Admission::Cancelled => return ControlFlow::Break(StopReason::Cancelled),
                }
            }
        }

        ControlFlow::Continue(())
    }

    /// Admits, resolves and counts one commenter
    async fn process_commenter(
        &mut self,
        commenter: &Commenter,
        post: &PostRef,
        enrich: bool,
    ) -> Admission {
        let user_id = commenter.user_id.as_str();
        if !self.tally.admit(user_id) {
            tracing::trace!("Already seen {}", user_id);
            return Admission::Duplicate;
        }

        let brand = match self.resolve_brand(user_id).await {
            Ok(brand) => brand,
            Err(ResolveError::Cancelled) => return Admission::Cancelled,
            Err(e) => {
                self.counters.resolution_failures += 1;
                tracing::warn!("Could not resolve brand of {}: {}", user_id, e);
                return Admission::Unresolved;
            }
        };

        let total = self.tally.record(user_id, &brand);
        tracing::info!(
            "[{}/{}] {} -> {}",
            total,
            self.settings.global_limit,
            user_id,
            brand
        );

        if let Some(handle) = self.enrichment.as_ref().filter(|_| enrich) {
            handle.submit(EnrichmentJob {
                user_id: user_id.to_string(),
                brand,
                comment_text: commenter.comment_text.clone(),
                post_text: post.text.clone(),
            });
        }

        Admission::Counted
    }

    /// Determines a user's device brand from their own recent posts
    ///
    /// Scans up to `brand_lookup_pages` pages and returns the first known
    /// brand. Failing that, the label of the first post with a non-empty
    /// source; failing that, [`UNKNOWN_DEVICE_LABEL`]. A user with no posts at
    /// all, or whose first page cannot be fetched, is a resolution failure.
    pub async fn resolve_brand(&mut self, user_id: &str) -> Result<String, ResolveError> {
        let mut fallback: Option<String> = None;

        for page_number in 1..=self.settings.brand_lookup_pages.max(1) {
            let posts = match self.fetch_posts(user_id, page_number).await {
                None => return Err(ResolveError::Cancelled),
                Some(Ok(PostPage::Posts(posts))) if !posts.is_empty() => posts,
                Some(Ok(_)) if page_number == 1 => {
                    return Err(ResolveError::NoPosts(user_id.to_string()))
                }
                Some(Ok(_)) => break,
                Some(Err(e)) if page_number == 1 => return Err(e.into()),
                Some(Err(e)) => {
                    tracing::debug!("Brand lookup of {} stopped at page {}: {}", user_id, page_number, e);
                    break;
                }
            };

            let sources = posts.iter().filter(|post| {
                post.author_id == user_id && !post.raw_device_source.trim().is_empty()
            });

            for post in sources {
                let label = self.classifier.classify(&post.raw_device_source);
                if self.classifier.is_known(&label) {
                    return Ok(label);
                }
                fallback.get_or_insert(label);
            }
        }

        Ok(fallback.unwrap_or_else(|| UNKNOWN_DEVICE_LABEL.to_string()))
    }

    fn limit_reached(&self) -> bool {
        self.tally.total() >= self.settings.global_limit
    }

    fn post_limit_reached(&self, counted_here: u64) -> bool {
        self.settings
            .per_post_limit
            .map_or(false, |limit| counted_here >= limit)
    }

    /// Waits for the pacer; false if cancelled while waiting
    async fn pace(&mut self) -> bool {
        let cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = self.pacer.wait() => true,
        }
    }

    /// Paced, cancellable post listing; `None` when cancelled
    async fn fetch_posts(
        &mut self,
        user_id: &str,
        page_number: u32,
    ) -> Option<Result<PostPage, FetchError>> {
        if !self.pace().await {
            return None;
        }

        let fetcher = Arc::clone(&self.fetcher);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = fetcher.list_posts(user_id, page_number) => Some(result),
        }
    }

    /// Paced, cancellable single-post lookup; `None` when cancelled
    async fn fetch_post(&mut self, post_id: &str) -> Option<Result<PostRef, FetchError>> {
        if !self.pace().await {
            return None;
        }

        let fetcher = Arc::clone(&self.fetcher);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = fetcher.get_post(post_id) => Some(result),
        }
    }

    /// Paced, cancellable comment listing; `None` when cancelled
    async fn fetch_comments(
        &mut self,
        post: &PostRef,
        cursor: u64,
    ) -> Option<Result<CommentPage, FetchError>> {
        if !self.pace().await {
            return None;
        }

        let fetcher = Arc::clone(&self.fetcher);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = fetcher.list_comments(&post.id, &post.author_id, cursor) => Some(result),
        }
    }
}
