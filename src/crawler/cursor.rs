//! Pagination state for the two nested sequences of a crawl
//!
//! Post pages are numbered from 1. Comment pages are addressed by an opaque
//! continuation value returned with each page; the API reports the end of a
//! stream with a continuation of 0, and the very first page is requested with
//! 0 as well, so the first page is always fetched regardless of the value.

/// Position within the post timeline and the current post's comment stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    page_number: u32,
    comment_continuation: u64,
    is_first_comment_page: bool,
}

impl CrawlCursor {
    pub fn new() -> Self {
        Self {
            page_number: 1,
            comment_continuation: 0,
            is_first_comment_page: true,
        }
    }

    /// The post page to fetch next
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn advance_page(&mut self) {
        self.page_number += 1;
    }

    /// Rewinds the comment stream to its first page
    pub fn begin_comments(&mut self) {
        self.comment_continuation = 0;
        self.is_first_comment_page = true;
    }

    /// The continuation to send with the next comment page request
    pub fn continuation(&self) -> u64 {
        self.comment_continuation
    }

    /// Whether another comment page should be requested
    pub fn has_more_comments(&self) -> bool {
        self.comment_continuation != 0 || self.is_first_comment_page
    }

    /// Records the continuation returned with the page just fetched
    pub fn advance_comments(&mut self, next: u64) {
        self.is_first_comment_page = false;
        self.comment_continuation = next;
    }

    /// Abandons the rest of the current comment stream
    pub fn end_comments(&mut self) {
        self.advance_comments(0);
    }
}

impl Default for CrawlCursor {
    fn default() -> Self {
        Self::new()
    }
}
