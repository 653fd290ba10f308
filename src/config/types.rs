use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Commenter-Census
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub client: ClientConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// The author whose commenters are counted
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Numeric id of the target author
    #[serde(rename = "author-id")]
    pub author_id: String,

    /// Restrict the crawl to these posts instead of paging the author's timeline
    #[serde(rename = "post-ids", default)]
    pub post_ids: Vec<String>,
}

/// Crawl limits and pacing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of counted users per run
    #[serde(rename = "global-limit", default = "default_global_limit")]
    pub global_limit: u64,

    /// Maximum number of counted users contributed by a single post
    #[serde(rename = "per-post-limit", default)]
    pub per_post_limit: Option<u64>,

    /// Minimum pause between two remote requests (seconds)
    #[serde(rename = "request-interval-seconds", default = "default_interval")]
    pub request_interval_seconds: u64,

    /// How many pages of a commenter's own posts are scanned for a brand
    #[serde(rename = "brand-lookup-pages", default = "default_lookup_pages")]
    pub brand_lookup_pages: u32,
}

impl CrawlerConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_seconds)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            global_limit: default_global_limit(),
            per_post_limit: None,
            request_interval_seconds: default_interval(),
            brand_lookup_pages: default_lookup_pages(),
        }
    }
}

/// Remote API client settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Scheme and host of the remote API
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Session cookie sent with every request
    pub cookie: String,

    /// User agent header; a desktop browser string is used when absent
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Parent directory for run output
    #[serde(default = "default_output_dir")]
    pub directory: String,

    /// Run name, appended to the author id to form the run directory
    #[serde(default = "default_output_name")]
    pub name: String,

    /// File name of the append-only progress log
    #[serde(rename = "progress-file", default = "default_progress_file")]
    pub progress_file: String,

    /// File name of the markdown report
    #[serde(rename = "summary-file", default = "default_summary_file")]
    pub summary_file: String,

    /// File name of the sentiment CSV export
    #[serde(rename = "sentiment-file", default = "default_sentiment_file")]
    pub sentiment_file: String,
}

impl OutputConfig {
    /// Directory holding every file produced for `author_id`
    pub fn run_dir(&self, author_id: &str) -> PathBuf {
        PathBuf::from(&self.directory).join(format!("{}_{}", author_id, self.name))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            name: default_output_name(),
            progress_file: default_progress_file(),
            summary_file: default_summary_file(),
            sentiment_file: default_sentiment_file(),
        }
    }
}

/// Optional sentiment classification of comments
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(rename = "api-key", default)]
    pub api_key: String,

    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(rename = "base-url", default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// System prompt; `{post}` is replaced by the text of the commented post
    #[serde(default = "default_prompt")]
    pub prompt: String,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(rename = "shutdown-timeout-seconds", default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl EnrichmentConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            base_url: default_llm_base_url(),
            model: default_model(),
            prompt: default_prompt(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_global_limit() -> u64 {
    100
}

fn default_interval() -> u64 {
    5
}

fn default_lookup_pages() -> u32 {
    1
}

fn default_base_url() -> String {
    "https://weibo.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_output_name() -> String {
    "census".to_string()
}

fn default_progress_file() -> String {
    "stats.txt".to_string()
}

fn default_summary_file() -> String {
    "summary.md".to_string()
}

fn default_sentiment_file() -> String {
    "stats-llm.csv".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_prompt() -> String {
    "You classify the stance of a comment towards the post it replies to. \
     Answer with a JSON object {\"value\": N} where 2 means supportive, \
     1 means opposed and 0 means neutral or unrelated. Detect sarcasm.\n\n\
     Post:\n{post}"
        .to_string()
}

fn default_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

fn default_shutdown_timeout() -> u64 {
    10
}
