//! Read-side use cases: paginated listing with an opportunistic cache and
//! single-article lookup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{AppContext, NewswireError, Result};
use crate::domain::ArticleView;
use crate::store::{ArticleStore, ListQuery};

const LIST_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleView>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

fn list_cache_key(query: &ListQuery) -> String {
    format!(
        "articles_list_{}_{}_{}_{}_{}",
        query.limit,
        query.offset,
        query.filter.language.as_deref().unwrap_or("all"),
        query.order_by.cache_token(),
        query.direction.keyword(),
    )
}

/// List stored articles, reading through the cache. A cache hit skips the
/// store entirely; cache decode failures fall back to the store.
pub fn list_articles(ctx: &AppContext, query: &ListQuery) -> Result<ArticlePage> {
    let key = list_cache_key(query);

    if let Some(cached) = ctx.cache.get(&key) {
        if let Ok(page) = serde_json::from_str::<ArticlePage>(&cached) {
            tracing::debug!(key, "Article list served from cache");
            return Ok(page);
        }
    }

    let articles = ctx
        .store
        .list_articles(query)?
        .iter()
        .map(ArticleView::from)
        .collect();
    let total = ctx.store.count_filtered(&query.filter)?;

    let page = ArticlePage {
        articles,
        total,
        limit: query.limit,
        offset: query.offset,
    };

    if let Ok(serialized) = serde_json::to_string(&page) {
        ctx.cache.set(&key, serialized, LIST_CACHE_TTL);
    }

    Ok(page)
}

/// Fetch one article by identifier; absent identifiers surface as a
/// not-found outcome.
pub fn get_article(ctx: &AppContext, id: &str) -> Result<ArticleView> {
    let article = ctx
        .store
        .get_article(id)?
        .ok_or_else(|| NewswireError::ArticleNotFound(id.to_string()))?;
    Ok(ArticleView::from(&article))
}
