use crate::app::{AppContext, NewswireError, Result};
use crate::feed::PageRequest;
use crate::normalizer::Normalizer;
use crate::readmodel;
use crate::store::{ArticleFilter, Direction, ListQuery, OrderBy};
use crate::sync::{CancelFlag, RunStats, SyncOptions};

fn sync_options(
    ctx: &AppContext,
    category: Option<String>,
    lang: Option<String>,
    max: Option<u32>,
) -> SyncOptions {
    SyncOptions {
        category: category.or_else(|| ctx.config.category.clone()),
        language: lang.or_else(|| ctx.config.language.clone()),
        page_size: max.unwrap_or(ctx.config.page_size),
    }
}

/// Cancel flag flipped by Ctrl-C so a long run ends cleanly between pages.
fn cancel_on_ctrl_c() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, finishing current page...");
            flag.cancel();
        }
    });
    cancel
}

fn invalidate_after_run(ctx: &AppContext, stats: &RunStats) {
    if stats.saved + stats.updated > 0 {
        ctx.cache.clear();
    }
}

pub async fn fetch(
    ctx: &AppContext,
    category: Option<String>,
    lang: Option<String>,
    max: Option<u32>,
) -> Result<()> {
    let options = sync_options(ctx, category, lang, max);
    println!(
        "Fetching articles (category: {}, language: {}, page size: {})",
        options.category.as_deref().unwrap_or("-"),
        options.language.as_deref().unwrap_or("-"),
        options.page_size
    );

    match ctx.engine.ingest(&options, &cancel_on_ctrl_c()).await {
        Ok(stats) => {
            invalidate_after_run(ctx, &stats);
            println!("Fetch completed");
            println!("  Pages fetched:        {}", stats.pages);
            println!("  Total fetched:        {}", stats.total);
            println!("  Saved:                {}", stats.saved);
            println!("  Skipped (duplicates): {}", stats.skipped);
            Ok(())
        }
        Err(aborted) => {
            invalidate_after_run(ctx, &aborted.partial);
            eprintln!(
                "Fetch aborted on page {} after saving {} article(s): {}",
                aborted.page, aborted.partial.saved, aborted.source
            );
            Err(aborted.into())
        }
    }
}

pub async fn resync(
    ctx: &AppContext,
    category: Option<String>,
    lang: Option<String>,
    max: Option<u32>,
) -> Result<()> {
    let options = sync_options(ctx, category, lang, max);
    println!(
        "Resyncing articles (category: {}, language: {}, page size: {})",
        options.category.as_deref().unwrap_or("-"),
        options.language.as_deref().unwrap_or("-"),
        options.page_size
    );

    match ctx.engine.resync(&options, &cancel_on_ctrl_c()).await {
        Ok(stats) => {
            invalidate_after_run(ctx, &stats);
            println!("Resync completed");
            println!("  Pages fetched:      {}", stats.pages);
            println!("  Total fetched:      {}", stats.total);
            println!("  New articles:       {}", stats.saved);
            println!("  Updated articles:   {}", stats.updated);
            println!("  Unchanged articles: {}", stats.unchanged);
            println!("  Skipped (errors):   {}", stats.skipped);
            Ok(())
        }
        Err(aborted) => {
            invalidate_after_run(ctx, &aborted.partial);
            eprintln!(
                "Resync aborted on page {} ({} new, {} updated so far): {}",
                aborted.page, aborted.partial.saved, aborted.partial.updated, aborted.source
            );
            Err(aborted.into())
        }
    }
}

pub fn list(
    ctx: &AppContext,
    limit: u32,
    offset: u32,
    language: Option<String>,
    order_by: &str,
    asc: bool,
) -> Result<()> {
    let order_by = OrderBy::parse(order_by).ok_or_else(|| {
        NewswireError::Other(format!(
            "Unknown sort field '{order_by}' (use publishedAt, createdAt, updatedAt, or title)"
        ))
    })?;

    let query = ListQuery {
        limit,
        offset,
        filter: ArticleFilter { language },
        order_by,
        direction: if asc { Direction::Asc } else { Direction::Desc },
    };

    let page = readmodel::list_articles(ctx, &query)?;

    if page.articles.is_empty() {
        println!("No articles found. Run `newswire fetch` to ingest some.");
        return Ok(());
    }

    println!(
        "Showing {}-{} of {} articles",
        page.offset + 1,
        page.offset + page.articles.len() as u32,
        page.total
    );
    for article in &page.articles {
        println!(
            "{}  {}  {}  {}",
            &article.id[..8.min(article.id.len())],
            article.published_at,
            article.source_name,
            article.title
        );
    }

    Ok(())
}

pub fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let article = readmodel::get_article(ctx, id)?;

    println!("{}", article.title);
    println!("  Source:      {} ({})", article.source_name, article.language);
    println!("  URL:         {}", article.url);
    if let Some(ref image) = article.image_url {
        println!("  Image:       {image}");
    }
    println!("  Published:   {}", article.published_at);
    println!("  Stored:      {}", article.created_at);
    println!("  Updated:     {}", article.updated_at);
    println!();
    println!("{}", article.description);
    println!();
    println!("{}", article.content);

    Ok(())
}

pub async fn search(
    ctx: &AppContext,
    query: &str,
    lang: Option<String>,
    max: Option<u32>,
    page: u32,
) -> Result<()> {
    let request = PageRequest::new(
        None,
        lang.or_else(|| ctx.config.language.clone()),
        max.unwrap_or(ctx.config.page_size),
    )
    .with_page(page);

    let records = ctx
        .feed
        .search(query, &request)
        .await
        .map_err(|e| match e {
            crate::feed::FeedError::Transport(e) => NewswireError::Transport(e),
            crate::feed::FeedError::Decode(msg) => NewswireError::Decode(msg),
        })?;

    if records.is_empty() {
        println!("No results for '{query}' on page {page}");
        return Ok(());
    }

    let normalizer = Normalizer::new();
    let fallback = request.language.as_deref().unwrap_or("en");
    for raw in &records {
        match normalizer.normalize(raw, fallback) {
            Ok(article) => println!(
                "{}  {}  {}",
                article.published_at_display(),
                article.source_name,
                article.title
            ),
            Err(e) => eprintln!("  (skipping malformed result: {e})"),
        }
    }

    Ok(())
}
