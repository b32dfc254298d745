use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{NewswireError, Result};
use crate::domain::Article;
use crate::store::{ArticleFilter, ArticleStore, ListQuery};

const ARTICLE_COLUMNS: &str = "id, title, description, content, url, image_url, \
     published_at, source_name, language, created_at, updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| NewswireError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            NewswireError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
        Ok(Article {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            content: row.get(3)?,
            url: row.get(4)?,
            image_url: row.get(5)?,
            published_at: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            source_name: row.get(7)?,
            language: row.get(8)?,
            created_at: row
                .get::<_, String>(9)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            updated_at: row
                .get::<_, String>(10)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn is_constraint_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
        )
    }
}

impl ArticleStore for SqliteStore {
    fn add_article(&self, article: &Article) -> Result<()> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT INTO articles (id, title, description, content, url, image_url, \
             published_at, source_name, language, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                article.id,
                article.title,
                article.description,
                article.content,
                article.url,
                article.image_url,
                article.published_at.to_rfc3339(),
                article.source_name,
                article.language,
                article.created_at.to_rfc3339(),
                article.updated_at.to_rfc3339()
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if Self::is_constraint_violation(&e) => {
                Err(NewswireError::DuplicateUrl(article.url.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_article(&self, article: &Article) -> Result<()> {
        let conn = self.conn()?;

        let rows = conn.execute(
            "UPDATE articles SET title = ?2, description = ?3, content = ?4, \
             image_url = ?5, published_at = ?6, source_name = ?7, language = ?8, \
             updated_at = ?9 WHERE id = ?1",
            params![
                article.id,
                article.title,
                article.description,
                article.content,
                article.image_url,
                article.published_at.to_rfc3339(),
                article.source_name,
                article.language,
                article.updated_at.to_rfc3339()
            ],
        )?;

        if rows == 0 {
            return Err(NewswireError::ArticleNotFound(article.id.clone()));
        }
        Ok(())
    }

    fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id],
                Self::row_to_article,
            )
            .optional()?;

        Ok(result)
    }

    fn get_article_by_url(&self, url: &str) -> Result<Option<Article>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = ?1"),
                params![url],
                Self::row_to_article,
            )
            .optional()?;

        Ok(result)
    }

    fn exists_by_url(&self, url: &str) -> Result<bool> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    fn list_articles(&self, query: &ListQuery) -> Result<Vec<Article>> {
        let conn = self.conn()?;

        // Column and direction come from closed enums, never from user text.
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles {} ORDER BY {} {} LIMIT ?1 OFFSET ?2",
            if query.filter.language.is_some() {
                "WHERE language = ?3"
            } else {
                ""
            },
            query.order_by.column(),
            query.direction.keyword(),
        );

        let mut stmt = conn.prepare(&sql)?;
        let articles = match query.filter.language {
            Some(ref language) => stmt
                .query_map(
                    params![query.limit, query.offset, language],
                    Self::row_to_article,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![query.limit, query.offset], Self::row_to_article)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        Ok(articles)
    }

    fn count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_filtered(&self, filter: &ArticleFilter) -> Result<i64> {
        let conn = self.conn()?;

        let count: i64 = match filter.language {
            Some(ref language) => conn.query_row(
                "SELECT COUNT(*) FROM articles WHERE language = ?1",
                params![language],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?,
        };

        Ok(count)
    }
}
