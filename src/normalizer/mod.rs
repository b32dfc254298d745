use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::domain::Article;
use crate::feed::RawArticle;

/// A single raw record failed normalization. Names the offending field so
/// skip-and-continue logging stays useful.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid article field '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Converts raw provider records into canonical [`Article`] values.
///
/// Deliberately lenient: absent title/description/content/source fields get
/// documented placeholder defaults instead of failing the record.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        raw: &RawArticle,
        fallback_language: &str,
    ) -> Result<Article, ValidationError> {
        self.normalize_at(raw, fallback_language, Utc::now())
    }

    /// Normalization against an explicit ingestion instant. The publication
    /// timestamp must not be later than `now`.
    pub fn normalize_at(
        &self,
        raw: &RawArticle,
        fallback_language: &str,
        now: DateTime<Utc>,
    ) -> Result<Article, ValidationError> {
        let url = raw
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ValidationError::new("url", "missing"))?;
        Url::parse(url).map_err(|e| ValidationError::new("url", e.to_string()))?;

        let title = required_with_default(&raw.title, "No title", "title")?;
        let description =
            required_with_default(&raw.description, "No description", "description")?;
        let content = required_with_default(&raw.content, "No content", "content")?;
        let source_name =
            required_with_default(&raw.source.name, "Unknown source", "source")?;

        let image_url = match raw.image.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(image) => {
                Url::parse(image).map_err(|e| ValidationError::new("image", e.to_string()))?;
                Some(image.to_string())
            }
        };

        let published_raw = raw
            .published_at
            .as_deref()
            .ok_or_else(|| ValidationError::new("publishedAt", "missing"))?;
        let published_at = DateTime::parse_from_rfc3339(published_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ValidationError::new("publishedAt", e.to_string()))?;
        if published_at > now {
            return Err(ValidationError::new(
                "publishedAt",
                "publication date cannot be in the future",
            ));
        }

        let language = raw
            .lang
            .as_deref()
            .unwrap_or(fallback_language)
            .trim()
            .to_lowercase();
        if language.is_empty() {
            return Err(ValidationError::new("language", "empty"));
        }

        Ok(Article {
            id: Article::generate_id(url),
            title,
            description,
            content,
            url: url.to_string(),
            image_url,
            published_at,
            source_name,
            language,
            created_at: now,
            updated_at: now,
        })
    }
}

fn required_with_default(
    value: &Option<String>,
    default: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    let resolved = value.as_deref().unwrap_or(default);
    if resolved.trim().is_empty() {
        return Err(ValidationError::new(field, "empty"));
    }
    Ok(resolved.to_string())
}
