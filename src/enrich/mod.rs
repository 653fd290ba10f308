//! Best-effort comment enrichment
//!
//! Every counted commenter may be handed to a sentiment classifier together
//! with the comment they wrote. Classification runs on a small pool of
//! background workers, stores its results apart from the brand histogram,
//! and never holds up or fails the crawl: errors are logged and dropped.

mod chat;
mod pool;

pub use chat::ChatSentimentClassifier;
pub use pool::{EnrichmentHandle, EnrichmentPool};

use async_trait::async_trait;
use thiserror::Error;

/// Work item for one counted commenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentJob {
    pub user_id: String,
    pub brand: String,
    pub comment_text: String,
    /// Text of the post the comment replies to
    pub post_text: String,
}

/// Classifier verdict for one comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentiment {
    pub value: i64,
    pub reasoning: Option<String>,
}

/// Stored outcome of an enrichment job, keyed by user id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub user_id: String,
    pub brand: String,
    pub sentiment_value: i64,
    pub reasoning: Option<String>,
}

/// Errors raised inside enrichment workers
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed classifier reply: {0}")]
    MalformedReply(String),
}

/// Assigns a sentiment value to a comment
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, comment: &str, post_text: &str)
        -> Result<Sentiment, EnrichmentError>;
}
