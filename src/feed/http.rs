use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::feed::{FeedApi, FeedError, PageRequest, RawArticle};

pub const DEFAULT_BASE_URL: &str = "https://gnews.io/api/v4";

#[derive(Debug, Default, Deserialize)]
struct PageEnvelope {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// GNews-style HTTP feed client. One request per page, no internal retries.
pub struct HttpFeedClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpFeedClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .user_agent("newswire/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            api_key,
        }
    }

    async fn get_page(
        &self,
        endpoint: &str,
        query: Vec<(&'static str, String)>,
        page: u32,
    ) -> Result<Vec<RawArticle>, FeedError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint);
        let started = Instant::now();

        let response = self.client.get(&url).query(&query).send().await?;
        let response = response.error_for_status()?;

        let body = response.text().await?;
        let envelope: PageEnvelope =
            serde_json::from_str(&body).map_err(|e| FeedError::Decode(e.to_string()))?;

        tracing::info!(
            endpoint,
            page,
            count = envelope.articles.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Feed page fetched"
        );

        Ok(envelope.articles)
    }

    fn base_query(&self, request: &PageRequest) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(ref language) = request.language {
            query.push(("lang", language.clone()));
        }
        query.push(("max", request.page_size.to_string()));
        query.push(("page", request.page.to_string()));
        query.push(("apikey", self.api_key.clone()));
        query
    }
}

#[async_trait]
impl FeedApi for HttpFeedClient {
    async fn top_headlines(
        &self,
        request: &PageRequest,
    ) -> Result<Vec<RawArticle>, FeedError> {
        let mut query = self.base_query(request);
        if let Some(ref category) = request.category {
            query.push(("category", category.clone()));
        }
        self.get_page("top-headlines", query, request.page).await
    }

    async fn search(
        &self,
        query_text: &str,
        request: &PageRequest,
    ) -> Result<Vec<RawArticle>, FeedError> {
        let mut query = self.base_query(request);
        query.push(("q", query_text.to_string()));
        self.get_page("search", query, request.page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SAMPLE: &str = r#"{
        "totalArticles": 2,
        "articles": [
            {
                "title": "First story",
                "description": "A description",
                "content": "Some content",
                "url": "https://example.com/first",
                "image": "https://example.com/first.jpg",
                "publishedAt": "2024-01-01T10:00:00Z",
                "source": {"name": "Example News", "url": "https://example.com"}
            },
            {
                "title": "Second story",
                "url": "https://example.com/second",
                "publishedAt": "2024-01-01T11:00:00Z",
                "source": {}
            }
        ]
    }"#;

    #[test]
    fn test_decode_page_envelope() {
        let envelope: PageEnvelope = serde_json::from_str(PAGE_SAMPLE).unwrap();
        assert_eq!(envelope.articles.len(), 2);
        assert_eq!(envelope.articles[0].title.as_deref(), Some("First story"));
        assert_eq!(
            envelope.articles[0].source.name.as_deref(),
            Some("Example News")
        );
        assert_eq!(envelope.articles[1].description, None);
        assert_eq!(envelope.articles[1].source.name, None);
    }

    #[test]
    fn test_decode_empty_page() {
        let envelope: PageEnvelope =
            serde_json::from_str(r#"{"totalArticles": 0, "articles": []}"#).unwrap();
        assert!(envelope.articles.is_empty());

        // Missing articles key decodes as an empty page too.
        let envelope: PageEnvelope = serde_json::from_str(r#"{"totalArticles": 0}"#).unwrap();
        assert!(envelope.articles.is_empty());
    }

    #[test]
    fn test_decode_malformed_payload() {
        let result: Result<PageEnvelope, _> = serde_json::from_str("<html>oops</html>");
        assert!(result.is_err());
    }

    #[test]
    fn test_base_query_includes_paging() {
        let client = HttpFeedClient::new(DEFAULT_BASE_URL.into(), "secret".into());
        let request = PageRequest::new(Some("world".into()), Some("en".into()), 25).with_page(3);

        let query = client.base_query(&request);
        assert!(query.contains(&("lang", "en".to_string())));
        assert!(query.contains(&("max", "25".to_string())));
        assert!(query.contains(&("page", "3".to_string())));
        assert!(query.contains(&("apikey", "secret".to_string())));
    }
}
