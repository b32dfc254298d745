//! The ingestion and synchronization engine.
//!
//! One run walks the provider's paginated headlines feed from page 1 until
//! an empty page, normalizing and deduplicating every record. Ingest runs
//! skip already-stored URLs; resync runs diff them and apply updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::dedup::{self, Outcome};
use crate::domain::Article;
use crate::feed::{FeedApi, FeedError, PageRequest};
use crate::normalizer::Normalizer;
use crate::store::ArticleStore;

const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_FALLBACK_LANGUAGE: &str = "en";

/// Counters accumulated over one run. Returned to the caller, never
/// persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Non-empty pages fetched.
    pub pages: u32,
    /// Records seen across all pages.
    pub total: u64,
    /// Articles persisted for the first time.
    pub saved: u64,
    /// Stored articles overwritten after a material change (resync only).
    pub updated: u64,
    /// Stored articles that matched field for field (resync only).
    pub unchanged: u64,
    /// Records skipped: ingest duplicates, validation failures, and
    /// per-record persistence failures.
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ingest,
    Resync,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Mode::Ingest => "ingest",
            Mode::Resync => "resync",
        }
    }
}

/// A page-level feed failure that ended the run. Carries the counters
/// accumulated before the failing page so callers can report how far the
/// run got.
#[derive(Error, Debug)]
#[error("{mode} run aborted on page {page}: {source}", mode = .mode.label())]
pub struct SyncAborted {
    pub mode: Mode,
    pub page: u32,
    pub partial: RunStats,
    #[source]
    pub source: FeedError,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub category: Option<String>,
    pub language: Option<String>,
    pub page_size: u32,
}

/// Cooperative cancellation flag, checked once per page iteration.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SyncEngine {
    feed: Arc<dyn FeedApi + Send + Sync>,
    store: Arc<dyn ArticleStore + Send + Sync>,
    normalizer: Normalizer,
    page_delay: Duration,
}

impl SyncEngine {
    pub fn new(
        feed: Arc<dyn FeedApi + Send + Sync>,
        store: Arc<dyn ArticleStore + Send + Sync>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            feed,
            store,
            normalizer,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Fetch every page of headlines and persist articles not seen before.
    /// Already-stored URLs are counted as skipped, never updated.
    pub async fn ingest(
        &self,
        options: &SyncOptions,
        cancel: &CancelFlag,
    ) -> Result<RunStats, SyncAborted> {
        self.run(Mode::Ingest, options, cancel).await
    }

    /// Walk the live feed and reconcile stored articles against it: new
    /// URLs are persisted, materially changed articles are overwritten,
    /// identical ones only counted.
    pub async fn resync(
        &self,
        options: &SyncOptions,
        cancel: &CancelFlag,
    ) -> Result<RunStats, SyncAborted> {
        self.run(Mode::Resync, options, cancel).await
    }

    async fn run(
        &self,
        mode: Mode,
        options: &SyncOptions,
        cancel: &CancelFlag,
    ) -> Result<RunStats, SyncAborted> {
        tracing::info!(
            mode = mode.label(),
            category = options.category.as_deref(),
            language = options.language.as_deref(),
            page_size = options.page_size,
            "Starting sync run"
        );

        let request = PageRequest::new(
            options.category.clone(),
            options.language.clone(),
            options.page_size,
        );
        let fallback_language = options
            .language
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_LANGUAGE);

        let mut stats = RunStats::default();
        let mut page: u32 = 1;

        loop {
            if cancel.is_cancelled() {
                tracing::info!(mode = mode.label(), page, "Run cancelled, stopping");
                break;
            }

            let records = match self
                .feed
                .top_headlines(&request.clone().with_page(page))
                .await
            {
                Ok(records) => records,
                Err(source) => {
                    tracing::error!(
                        mode = mode.label(),
                        page,
                        error = %source,
                        "Feed page fetch failed, aborting run"
                    );
                    return Err(SyncAborted {
                        mode,
                        page,
                        partial: stats,
                        source,
                    });
                }
            };

            if records.is_empty() {
                tracing::info!(mode = mode.label(), page, "Empty page received, stopping");
                break;
            }

            stats.pages = page;
            stats.total += records.len() as u64;

            for raw in &records {
                let candidate = match self.normalizer.normalize(raw, fallback_language) {
                    Ok(candidate) => candidate,
                    Err(e) => {
                        stats.skipped += 1;
                        tracing::warn!(
                            mode = mode.label(),
                            url = raw.url.as_deref(),
                            error = %e,
                            "Skipping record that failed normalization"
                        );
                        continue;
                    }
                };

                match mode {
                    Mode::Ingest => self.apply_ingest(&candidate, &mut stats),
                    Mode::Resync => self.apply_resync(&candidate, &mut stats),
                }
            }

            page += 1;

            // Provider rate limit: keep a fixed spacing between page fetches.
            tokio::time::sleep(self.page_delay).await;
        }

        stats.pages = page - 1;
        tracing::info!(
            mode = mode.label(),
            pages = stats.pages,
            total = stats.total,
            saved = stats.saved,
            updated = stats.updated,
            unchanged = stats.unchanged,
            skipped = stats.skipped,
            "Sync run completed"
        );

        Ok(stats)
    }

    fn apply_ingest(&self, candidate: &Article, stats: &mut RunStats) {
        match self.store.exists_by_url(&candidate.url) {
            Ok(true) => {
                stats.skipped += 1;
                tracing::debug!(url = %candidate.url, "Skipping duplicate article");
            }
            Ok(false) => match self.store.add_article(candidate) {
                Ok(()) => {
                    stats.saved += 1;
                    tracing::debug!(id = %candidate.id, "Article saved");
                }
                Err(e) => {
                    // Covers the duplicate-insert race with a concurrent run.
                    stats.skipped += 1;
                    tracing::warn!(url = %candidate.url, error = %e, "Failed to save article");
                }
            },
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!(url = %candidate.url, error = %e, "Duplicate lookup failed");
            }
        }
    }

    fn apply_resync(&self, candidate: &Article, stats: &mut RunStats) {
        let existing = match self.store.get_article_by_url(&candidate.url) {
            Ok(existing) => existing,
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!(url = %candidate.url, error = %e, "Lookup failed during resync");
                return;
            }
        };

        match dedup::classify(candidate, existing.as_ref()) {
            Outcome::New => match self.store.add_article(candidate) {
                Ok(()) => {
                    stats.saved += 1;
                    tracing::debug!(id = %candidate.id, "New article saved");
                }
                Err(e) => {
                    stats.skipped += 1;
                    tracing::warn!(url = %candidate.url, error = %e, "Failed to save new article");
                }
            },
            Outcome::Changed => {
                let existing = existing.expect("changed outcome implies a stored article");
                let merged = Article::updated_from(&existing, candidate);
                match self.store.update_article(&merged) {
                    Ok(()) => {
                        stats.updated += 1;
                        tracing::info!(id = %merged.id, url = %merged.url, "Article updated");
                    }
                    Err(e) => {
                        stats.skipped += 1;
                        tracing::warn!(url = %candidate.url, error = %e, "Failed to update article");
                    }
                }
            }
            Outcome::Unchanged => {
                stats.unchanged += 1;
                tracing::debug!(url = %candidate.url, "Article unchanged");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{RawArticle, RawSource};
    use crate::store::SqliteStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted feed: one entry per page, consumed in order. `None` scripts
    /// a transport failure for that page. When `cancel_after_serve` is set,
    /// the flag is raised as each page is handed out, as a Ctrl-C landing
    /// mid-run would.
    struct ScriptedFeed {
        pages: Mutex<Vec<Option<Vec<RawArticle>>>>,
        cancel_after_serve: Option<CancelFlag>,
    }

    impl ScriptedFeed {
        fn new(pages: Vec<Option<Vec<RawArticle>>>) -> Self {
            Self {
                pages: Mutex::new(pages),
                cancel_after_serve: None,
            }
        }

        fn cancelling_after_serve(pages: Vec<Option<Vec<RawArticle>>>, cancel: CancelFlag) -> Self {
            Self {
                pages: Mutex::new(pages),
                cancel_after_serve: Some(cancel),
            }
        }
    }

    #[async_trait]
    impl FeedApi for ScriptedFeed {
        async fn top_headlines(
            &self,
            _request: &PageRequest,
        ) -> Result<Vec<RawArticle>, FeedError> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(Vec::new());
            }
            let page = pages.remove(0);
            if let Some(cancel) = &self.cancel_after_serve {
                cancel.cancel();
            }
            match page {
                Some(records) => Ok(records),
                None => Err(FeedError::Decode("scripted failure".into())),
            }
        }

        async fn search(
            &self,
            _query: &str,
            _request: &PageRequest,
        ) -> Result<Vec<RawArticle>, FeedError> {
            Ok(Vec::new())
        }
    }

    /// Store whose writes always fail while reads pass through, standing in
    /// for per-record persistence failures such as a lost insert race.
    struct RejectingStore {
        inner: Arc<SqliteStore>,
    }

    impl ArticleStore for RejectingStore {
        fn add_article(&self, article: &Article) -> crate::app::Result<()> {
            Err(crate::app::NewswireError::DuplicateUrl(article.url.clone()))
        }

        fn update_article(&self, article: &Article) -> crate::app::Result<()> {
            Err(crate::app::NewswireError::ArticleNotFound(article.id.clone()))
        }

        fn get_article(&self, id: &str) -> crate::app::Result<Option<Article>> {
            self.inner.get_article(id)
        }

        fn get_article_by_url(&self, url: &str) -> crate::app::Result<Option<Article>> {
            self.inner.get_article_by_url(url)
        }

        fn exists_by_url(&self, url: &str) -> crate::app::Result<bool> {
            self.inner.exists_by_url(url)
        }

        fn list_articles(
            &self,
            query: &crate::store::ListQuery,
        ) -> crate::app::Result<Vec<Article>> {
            self.inner.list_articles(query)
        }

        fn count(&self) -> crate::app::Result<i64> {
            self.inner.count()
        }

        fn count_filtered(
            &self,
            filter: &crate::store::ArticleFilter,
        ) -> crate::app::Result<i64> {
            self.inner.count_filtered(filter)
        }
    }

    fn raw(url: &str) -> RawArticle {
        RawArticle {
            title: Some(format!("Story at {url}")),
            description: Some("A description".into()),
            content: Some("Some content".into()),
            url: Some(url.into()),
            image: None,
            published_at: Some("2024-01-01T10:00:00Z".into()),
            lang: Some("en".into()),
            source: RawSource {
                name: Some("Example News".into()),
                url: None,
            },
        }
    }

    fn engine(pages: Vec<Option<Vec<RawArticle>>>) -> (SyncEngine, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let engine = SyncEngine::new(
            Arc::new(ScriptedFeed::new(pages)),
            store.clone(),
            Normalizer::new(),
        )
        .with_page_delay(Duration::from_millis(0));
        (engine, store)
    }

    fn engine_with_store(
        pages: Vec<Option<Vec<RawArticle>>>,
        store: Arc<SqliteStore>,
    ) -> SyncEngine {
        SyncEngine::new(
            Arc::new(ScriptedFeed::new(pages)),
            store,
            Normalizer::new(),
        )
        .with_page_delay(Duration::from_millis(0))
    }

    fn options() -> SyncOptions {
        SyncOptions {
            category: None,
            language: Some("en".into()),
            page_size: 10,
        }
    }

    #[tokio::test]
    async fn test_ingest_two_pages_then_empty() {
        let (engine, store) = engine(vec![
            Some(vec![raw("https://example.com/1"), raw("https://example.com/2")]),
            Some(vec![raw("https://example.com/3")]),
            Some(vec![]),
        ]);

        let stats = engine.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.saved, 3);
        assert_eq!(stats.skipped, 0);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let pages = || {
            vec![
                Some(vec![raw("https://example.com/1"), raw("https://example.com/2")]),
                Some(vec![]),
            ]
        };

        let first = engine_with_store(pages(), store.clone());
        let stats = first.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.saved, 2);
        assert_eq!(stats.skipped, 0);

        let second = engine_with_store(pages(), store.clone());
        let stats = second.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.saved, 0);
        assert_eq!(stats.skipped, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_first_page_is_successful_zero_run() {
        let (engine, store) = engine(vec![Some(vec![])]);
        let stats = engine.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats, RunStats::default());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_with_partial_stats() {
        let (engine, store) = engine(vec![
            Some(vec![raw("https://example.com/1"), raw("https://example.com/2")]),
            None,
        ]);

        let err = engine
            .ingest(&options(), &CancelFlag::new())
            .await
            .unwrap_err();
        assert_eq!(err.page, 2);
        assert_eq!(err.mode, Mode::Ingest);
        assert_eq!(err.partial.saved, 2);
        assert_eq!(err.partial.pages, 1);
        // Page 1 records were persisted before the abort.
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_abort_page() {
        let mut bad = raw("https://example.com/bad");
        bad.published_at = Some("not-a-date".into());

        let (engine, store) = engine(vec![
            Some(vec![
                raw("https://example.com/1"),
                bad,
                raw("https://example.com/2"),
            ]),
            Some(vec![]),
        ]);

        let stats = engine.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.saved, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_resync_classifies_new_changed_unchanged() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let seed = engine_with_store(
            vec![
                Some(vec![raw("https://example.com/keep"), raw("https://example.com/change")]),
                Some(vec![]),
            ],
            store.clone(),
        );
        seed.ingest(&options(), &CancelFlag::new()).await.unwrap();

        let before = store
            .get_article_by_url("https://example.com/change")
            .unwrap()
            .unwrap();

        let mut changed = raw("https://example.com/change");
        changed.description = Some("A fresher description".into());

        let resync = engine_with_store(
            vec![
                Some(vec![
                    raw("https://example.com/keep"),
                    changed,
                    raw("https://example.com/brand-new"),
                ]),
                Some(vec![]),
            ],
            store.clone(),
        );
        let stats = resync.resync(&options(), &CancelFlag::new()).await.unwrap();

        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.skipped, 0);

        let after = store
            .get_article_by_url("https://example.com/change")
            .unwrap()
            .unwrap();
        assert_eq!(after.description, "A fresher description");
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_ingest_never_updates_duplicates() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let seed = engine_with_store(
            vec![Some(vec![raw("https://example.com/1")]), Some(vec![])],
            store.clone(),
        );
        seed.ingest(&options(), &CancelFlag::new()).await.unwrap();

        let mut changed = raw("https://example.com/1");
        changed.title = Some("A different headline".into());

        let again = engine_with_store(vec![Some(vec![changed]), Some(vec![])], store.clone());
        let stats = again.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.saved, 0);

        let stored = store
            .get_article_by_url("https://example.com/1")
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Story at https://example.com/1");
    }

    #[tokio::test]
    async fn test_cancellation_stops_before_first_page() {
        let (engine, store) = engine(vec![
            Some(vec![raw("https://example.com/1")]),
            Some(vec![]),
        ]);

        let cancel = CancelFlag::new();
        cancel.cancel();

        let stats = engine.ingest(&options(), &cancel).await.unwrap();
        assert_eq!(stats, RunStats::default());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_after_first_page_keeps_its_stats() {
        let cancel = CancelFlag::new();
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let feed = ScriptedFeed::cancelling_after_serve(
            vec![
                Some(vec![raw("https://example.com/1")]),
                Some(vec![raw("https://example.com/2")]),
                Some(vec![]),
            ],
            cancel.clone(),
        );
        let engine = SyncEngine::new(Arc::new(feed), store.clone(), Normalizer::new())
            .with_page_delay(Duration::from_millis(0));

        let stats = engine.ingest(&options(), &cancel).await.unwrap();
        // Page 1 is finished before the flag is checked again; page 2 is
        // never fetched.
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.saved, 1);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_persistence_failure_is_recoverable() {
        let inner = Arc::new(SqliteStore::in_memory().unwrap());
        let store = Arc::new(RejectingStore {
            inner: inner.clone(),
        });
        let engine = SyncEngine::new(
            Arc::new(ScriptedFeed::new(vec![
                Some(vec![raw("https://example.com/1"), raw("https://example.com/2")]),
                Some(vec![]),
            ])),
            store,
            Normalizer::new(),
        )
        .with_page_delay(Duration::from_millis(0));

        // Every insert fails, but the run still walks to the empty page and
        // reports the failures as skipped rather than aborting.
        let stats = engine.ingest(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.saved, 0);
        assert_eq!(stats.skipped, 2);
        assert_eq!(inner.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_resync_update_failure_is_recoverable() {
        let inner = Arc::new(SqliteStore::in_memory().unwrap());
        let seed = engine_with_store(
            vec![Some(vec![raw("https://example.com/1")]), Some(vec![])],
            inner.clone(),
        );
        seed.ingest(&options(), &CancelFlag::new()).await.unwrap();

        let mut changed = raw("https://example.com/1");
        changed.description = Some("A fresher description".into());

        let engine = SyncEngine::new(
            Arc::new(ScriptedFeed::new(vec![Some(vec![changed]), Some(vec![])])),
            Arc::new(RejectingStore {
                inner: inner.clone(),
            }),
            Normalizer::new(),
        )
        .with_page_delay(Duration::from_millis(0));

        let stats = engine.resync(&options(), &CancelFlag::new()).await.unwrap();
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.skipped, 1);

        // The stored article is left as it was.
        let stored = inner
            .get_article_by_url("https://example.com/1")
            .unwrap()
            .unwrap();
        assert_eq!(stored.description, "A description");
    }
}
