use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Display format shared by the read surface and the dedup comparison
/// of publication timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A canonical news article. Immutable once constructed; the update path
/// goes through [`Article::updated_from`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    /// Canonical source link; the sole business key for identity.
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Generate a deterministic ID from the canonical URL.
    pub fn generate_id(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Rebuild a stored article with the candidate's fields, carrying over
    /// the original identity and creation timestamp and refreshing the
    /// update timestamp.
    pub fn updated_from(existing: &Article, candidate: &Article) -> Article {
        Article {
            id: existing.id.clone(),
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            content: candidate.content.clone(),
            url: existing.url.clone(),
            image_url: candidate.image_url.clone(),
            published_at: candidate.published_at,
            source_name: candidate.source_name.clone(),
            language: candidate.language.clone(),
            created_at: existing.created_at,
            updated_at: Utc::now(),
        }
    }

    pub fn published_at_display(&self) -> String {
        self.published_at.format(TIMESTAMP_FORMAT).to_string()
    }
}
