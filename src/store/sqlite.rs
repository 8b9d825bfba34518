use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Row, Sqlite,
};
use std::path::Path;
use std::str::FromStr;
use tokio::time::Duration;
use tracing::{debug, info, instrument};

use crate::news::NewsRecord;
use crate::TARGET_DB;

/// News documents in a local SQLite file.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    #[instrument(target = "db", level = "info")]
    pub async fn new(database_path: &Path) -> Result<Self, sqlx::Error> {
        info!(target: TARGET_DB, "Creating database pool for: {}", database_path.display());

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", database_path.display()))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5))
                .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        info!(target: TARGET_DB, "Database pool created");

        let store = SqliteStore { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// A private in-memory database, gone when the store is dropped.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = SqliteStore { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                source TEXT,
                date TEXT,
                summary TEXT,
                country TEXT,
                region TEXT,
                city TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_news_date ON news (date);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stores a record; saving a URL that already exists returns the stored id.
    pub async fn save(&self, record: &NewsRecord) -> Result<String> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO news (url, title, description, source, date, summary, country, region, city, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(url) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&record.url)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.source)
        .bind(&record.date)
        .bind(&record.summary)
        .bind(&record.country)
        .bind(&record.region)
        .bind(&record.city)
        .bind(&created_at)
        .fetch_optional(&self.pool)
        .await?;

        let id = match inserted {
            Some(id) => id,
            None => {
                debug!(target: TARGET_DB, "Already stored: {}", record.url);
                sqlx::query_scalar::<_, i64>("SELECT id FROM news WHERE url = ?")
                    .bind(&record.url)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(id.to_string())
    }

    /// Newest first by publication day; undated records go last.
    pub async fn list(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url, title, description, source, date, summary, country, region, city
            FROM news
            ORDER BY date IS NULL, date DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(|row| NewsRecord {
                id: Some(row.get::<i64, _>("id").to_string()),
                url: row.get("url"),
                title: row.get("title"),
                description: row.get("description"),
                source: row.get("source"),
                date: row.get("date"),
                summary: row.get("summary"),
                country: row.get("country"),
                region: row.get("region"),
                city: row.get("city"),
            })
            .collect();
        Ok(records)
    }

    pub async fn contains_url(&self, url: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM news WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Removes every record, returning how many there were.
    pub async fn clear(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM news").execute(&self.pool).await?;
        info!(target: TARGET_DB, "Deleted {} news records", result.rows_affected());
        Ok(result.rows_affected() as usize)
    }
}
