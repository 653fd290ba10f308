//! Remote data source interface
//!
//! This module defines what the coordinator needs from the remote API:
//! - Listing an author's posts, one numbered page at a time
//! - Listing the comments on a post, addressed by a continuation cursor
//! - Looking up a single post by id
//!
//! along with the data model those calls return and the HTTP client builder
//! used by the production implementation.

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Desktop browser identification used when the config names none
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// A post as listed on an author's timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    /// Identifier used to list the post's comments
    pub id: String,

    /// Id of the user who authored the post
    pub author_id: String,

    /// Free-form device string attached to the post (may be empty)
    pub raw_device_source: String,

    /// Post body, used as context for comment enrichment
    pub text: String,
}

/// One comment on a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commenter {
    /// Id of the commenting user; the dedup key
    pub user_id: String,

    pub comment_text: String,
}

/// Result of listing one page of an author's posts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPage {
    /// A page of posts
    Posts(Vec<PostRef>),

    /// The author has no further posts; not an error
    EndOfData,
}

/// Result of listing one page of a post's comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPage {
    pub commenters: Vec<Commenter>,

    /// Cursor for the following page; 0 means the stream is exhausted
    pub next_cursor: u64,
}

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Post {0} not found")]
    PostNotFound(String),
}

/// Source of posts and comments
///
/// Implementations may fail transiently; deciding whether a failure is
/// terminal is left to the caller.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Lists page `page` (1-based) of the posts on `author_id`'s timeline
    async fn list_posts(&self, author_id: &str, page: u32) -> Result<PostPage, FetchError>;

    /// Lists the comments on `post_id` starting at `cursor` (0 for the first page)
    async fn list_comments(
        &self,
        post_id: &str,
        author_id: &str,
        cursor: u64,
    ) -> Result<CommentPage, FetchError>;

    /// Looks up one post, including its body and author
    async fn get_post(&self, post_id: &str) -> Result<PostRef, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// The session cookie is attached per request, so only static headers are
/// installed here.
///
/// # Example
///
/// ```no_run
/// use commenter_census::config::ClientConfig;
/// use commenter_census::crawler::build_http_client;
///
/// let config = ClientConfig {
///     base_url: "https://weibo.com".to_string(),
///     cookie: "SUB=abc".to_string(),
///     user_agent: None,
///     timeout_seconds: 30,
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
    headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );

    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
