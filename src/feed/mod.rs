pub mod http;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Provider-enforced maximum page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page worth of request parameters for the headlines feed.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub category: Option<String>,
    pub language: Option<String>,
    pub page_size: u32,
    /// 1-based page number.
    pub page: u32,
}

impl PageRequest {
    pub fn new(category: Option<String>, language: Option<String>, page_size: u32) -> Self {
        Self {
            category,
            language,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            page: 1,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// A raw provider record, as decoded from the feed payload. Everything but
/// the URL is optional; normalization decides what is acceptable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub lang: Option<String>,
    #[serde(default)]
    pub source: RawSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed payload decode error: {0}")]
    Decode(String),
}

/// Paginated access to the upstream news provider. Implementations must not
/// retry internally; retry policy belongs to the caller. An empty record
/// sequence means the provider has no more results for that page.
#[async_trait]
pub trait FeedApi {
    async fn top_headlines(&self, request: &PageRequest)
        -> Result<Vec<RawArticle>, FeedError>;

    async fn search(
        &self,
        query: &str,
        request: &PageRequest,
    ) -> Result<Vec<RawArticle>, FeedError>;
}
