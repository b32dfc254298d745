use serde::{Deserialize, Serialize};

use crate::domain::article::{Article, TIMESTAMP_FORMAT};

/// Read-model shape for listing and detail endpoints. All timestamps are
/// rendered as fixed-format strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: String,
    pub source_name: String,
    pub language: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            url: article.url.clone(),
            image_url: article.image_url.clone(),
            published_at: article.published_at.format(TIMESTAMP_FORMAT).to_string(),
            source_name: article.source_name.clone(),
            language: article.language.clone(),
            created_at: article.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: article.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}
