use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{NewswireError, Result};
use crate::cache::memory::MemoryCache;
use crate::cache::Cache;
use crate::config::Config;
use crate::feed::http::HttpFeedClient;
use crate::feed::FeedApi;
use crate::normalizer::Normalizer;
use crate::store::sqlite::SqliteStore;
use crate::sync::SyncEngine;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub feed: Arc<dyn FeedApi + Send + Sync>,
    pub cache: Arc<dyn Cache + Send + Sync>,
    pub engine: SyncEngine,
    pub config: Config,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path.or_else(|| config.db_path.clone()) {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::assemble(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::assemble(config, store)
    }

    fn assemble(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let feed: Arc<dyn FeedApi + Send + Sync> = Arc::new(HttpFeedClient::new(
            config.base_url.clone(),
            config.resolved_api_key(),
        ));
        let cache: Arc<dyn Cache + Send + Sync> = Arc::new(MemoryCache::new());
        let engine = SyncEngine::new(feed.clone(), store.clone(), Normalizer::new())
            .with_page_delay(config.page_delay());

        Ok(Self {
            store,
            feed,
            cache,
            engine,
            config,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NewswireError::Config("Could not find data directory".into()))?;
        let newswire_dir = data_dir.join("newswire");
        std::fs::create_dir_all(&newswire_dir)?;
        Ok(newswire_dir.join("newswire.db"))
    }
}
