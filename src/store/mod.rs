pub mod sqlite;

use crate::app::Result;
use crate::domain::Article;

pub use sqlite::SqliteStore;

/// Sort column for article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    PublishedAt,
    CreatedAt,
    UpdatedAt,
    Title,
}

impl OrderBy {
    pub fn column(self) -> &'static str {
        match self {
            OrderBy::PublishedAt => "published_at",
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
            OrderBy::Title => "title",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "publishedAt" | "published_at" => Some(OrderBy::PublishedAt),
            "createdAt" | "created_at" => Some(OrderBy::CreatedAt),
            "updatedAt" | "updated_at" => Some(OrderBy::UpdatedAt),
            "title" => Some(OrderBy::Title),
            _ => None,
        }
    }

    pub fn cache_token(self) -> &'static str {
        match self {
            OrderBy::PublishedAt => "publishedAt",
            OrderBy::CreatedAt => "createdAt",
            OrderBy::UpdatedAt => "updatedAt",
            OrderBy::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    pub filter: ArticleFilter,
    pub order_by: OrderBy,
    pub direction: Direction,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            filter: ArticleFilter::default(),
            order_by: OrderBy::default(),
            direction: Direction::default(),
        }
    }
}

pub trait ArticleStore {
    /// Persist a new article. Fails with `DuplicateUrl` when an article with
    /// the same URL is already stored.
    fn add_article(&self, article: &Article) -> Result<()>;

    /// Overwrite a stored article by identifier. Fails with
    /// `ArticleNotFound` when the identifier is absent.
    fn update_article(&self, article: &Article) -> Result<()>;

    fn get_article(&self, id: &str) -> Result<Option<Article>>;
    fn get_article_by_url(&self, url: &str) -> Result<Option<Article>>;
    fn exists_by_url(&self, url: &str) -> Result<bool>;

    fn list_articles(&self, query: &ListQuery) -> Result<Vec<Article>>;
    fn count(&self) -> Result<i64>;
    fn count_filtered(&self, filter: &ArticleFilter) -> Result<i64>;
}
