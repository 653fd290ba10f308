//! HTTP implementation of [`Fetcher`] against the platform's JSON endpoints

use crate::config::ClientConfig;
use crate::crawler::fetcher::{
    build_http_client, CommentPage, Commenter, FetchError, Fetcher, PostPage, PostRef,
};
use async_trait::async_trait;
use reqwest::header::{COOKIE, REFERER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const POSTS_PATH: &str = "/ajax/statuses/mymblog";
const COMMENTS_PATH: &str = "/ajax/statuses/buildComments";
const POST_PATH: &str = "/ajax/statuses/show";
const COMMENTS_PER_PAGE: &str = "20";

#[derive(Debug, Deserialize)]
struct PostListResponse {
    #[serde(default)]
    data: Option<PostListData>,
}

#[derive(Debug, Deserialize)]
struct PostListData {
    #[serde(default)]
    list: Vec<RawPost>,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    #[serde(default)]
    idstr: String,
    #[serde(default)]
    mblogid: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    text_raw: String,
    #[serde(default)]
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    #[serde(default)]
    idstr: String,
}

#[derive(Debug, Deserialize)]
struct CommentListResponse {
    #[serde(default)]
    data: Vec<RawComment>,
    #[serde(default)]
    max_id: u64,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: Option<RawUser>,
}

impl From<RawPost> for PostRef {
    fn from(raw: RawPost) -> Self {
        let id = if raw.mblogid.is_empty() {
            raw.idstr
        } else {
            raw.mblogid
        };

        PostRef {
            id,
            author_id: raw.user.map(|u| u.idstr).unwrap_or_default(),
            raw_device_source: raw.source,
            text: raw.text_raw,
        }
    }
}

/// Cookie-authenticated client for the timeline and comment endpoints
pub struct WeiboFetcher {
    client: Client,
    base_url: String,
    cookie: String,
}

impl WeiboFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie: config.cookie.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header(COOKIE, self.cookie.as_str())
            .header(REFERER, self.base_url.as_str())
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Network {
            url: url.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for WeiboFetcher {
    async fn list_posts(&self, author_id: &str, page: u32) -> Result<PostPage, FetchError> {
        let page = page.to_string();
        let response: PostListResponse = self
            .get_json(
                POSTS_PATH,
                &[("uid", author_id), ("page", page.as_str()), ("feature", "0")],
            )
            .await?;

        let posts: Vec<PostRef> = response
            .data
            .map(|data| data.list)
            .unwrap_or_default()
            .into_iter()
            .map(PostRef::from)
            .collect();

        tracing::debug!(
            "Listed {} posts for {} (page {})",
            posts.len(),
            author_id,
            page
        );

        if posts.is_empty() {
            return Ok(PostPage::EndOfData);
        }
        Ok(PostPage::Posts(posts))
    }

    async fn list_comments(
        &self,
        post_id: &str,
        author_id: &str,
        cursor: u64,
    ) -> Result<CommentPage, FetchError> {
        let max_id = cursor.to_string();
        let response: CommentListResponse = self
            .get_json(
                COMMENTS_PATH,
                &[
                    ("flow", "0"),
                    ("is_reload", "1"),
                    ("id", post_id),
                    ("is_show_bulletin", "2"),
                    ("is_mix", "0"),
                    ("count", COMMENTS_PER_PAGE),
                    ("uid", author_id),
                    ("fetch_level", "0"),
                    ("locale", "zh-CN"),
                    ("max_id", max_id.as_str()),
                ],
            )
            .await?;

        let commenters = response
            .data
            .into_iter()
            .filter_map(|comment| {
                let user_id = comment.user.map(|u| u.idstr)?;
                if user_id.is_empty() {
                    return None;
                }
                Some(Commenter {
                    user_id,
                    comment_text: comment.text,
                })
            })
            .collect();

        Ok(CommentPage {
            commenters,
            next_cursor: response.max_id,
        })
    }

    async fn get_post(&self, post_id: &str) -> Result<PostRef, FetchError> {
        let raw: RawPost = self
            .get_json(
                POST_PATH,
                &[("id", post_id), ("locale", "zh-CN"), ("isGetLongText", "true")],
            )
            .await?;

        // Missing posts come back as a 200 with an error envelope.
        if raw.idstr.is_empty() && raw.mblogid.is_empty() {
            return Err(FetchError::PostNotFound(post_id.to_string()));
        }

        Ok(PostRef::from(raw))
    }
}
