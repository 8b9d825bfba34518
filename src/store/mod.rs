//! Document datastores holding collected news.

pub mod notion;
pub mod sqlite;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::environment::{Config, DatastoreKind};
use crate::news::NewsRecord;
use crate::TARGET_DB;

pub use notion::NotionStore;
pub use sqlite::SqliteStore;

/// The configured datastore.
#[derive(Clone, Debug)]
pub enum Datastore {
    Notion(NotionStore),
    Sqlite(SqliteStore),
}

impl Datastore {
    /// Opens the datastore selected by `DATASTORE`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = match config.datastore {
            DatastoreKind::Notion => {
                let api_key = config
                    .notion_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("NOTION_API_KEY is required for the notion datastore"))?;
                let database_id = config
                    .notion_database_id
                    .as_deref()
                    .ok_or_else(|| anyhow!("NOTION_DATABASE_ID is required for the notion datastore"))?;
                Datastore::Notion(NotionStore::new(api_key, database_id))
            }
            DatastoreKind::Sqlite => Datastore::Sqlite(
                SqliteStore::new(&config.database_path)
                    .await
                    .with_context(|| {
                        format!("Failed to open {}", config.database_path.display())
                    })?,
            ),
        };
        info!(target: TARGET_DB, "Using {} datastore", store.name());
        Ok(store)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Datastore::Notion(_) => "notion",
            Datastore::Sqlite(_) => "sqlite",
        }
    }

    /// Saves a record and returns its datastore id.
    pub async fn save(&self, record: &NewsRecord) -> Result<String> {
        match self {
            Datastore::Notion(store) => store.save(record).await,
            Datastore::Sqlite(store) => store.save(record).await,
        }
    }

    /// Up to `limit` records, newest first.
    pub async fn list(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        match self {
            Datastore::Notion(store) => store.list(limit).await,
            Datastore::Sqlite(store) => store.list(limit).await,
        }
    }

    pub async fn contains_url(&self, url: &str) -> Result<bool> {
        match self {
            Datastore::Notion(store) => store.contains_url(url).await,
            Datastore::Sqlite(store) => store.contains_url(url).await,
        }
    }

    pub async fn count(&self) -> Result<usize> {
        match self {
            Datastore::Notion(store) => store.count().await,
            Datastore::Sqlite(store) => store.count().await,
        }
    }

    /// Removes (or archives) every record and returns how many went.
    pub async fn clear(&self) -> Result<usize> {
        match self {
            Datastore::Notion(store) => store.clear().await,
            Datastore::Sqlite(store) => store.clear().await,
        }
    }
}
