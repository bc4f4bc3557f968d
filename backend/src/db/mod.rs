mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::Config;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Collection holding every inventory document.
pub const ITEMS_COLLECTION: &str = "items";

/// Flat field map stored under a document key.
pub type Fields = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No document found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    #[error("Document already exists: {collection}/{key}")]
    AlreadyExists { collection: String, key: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn already_exists(collection: &str, key: &str) -> Self {
        Self::AlreadyExists {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}

// ── Store contract ────────────────────────────────────────────────────────────

/// Key-document operations against a single collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn collection(&self) -> &str;

    async fn get(&self, key: &str) -> StoreResult<Option<Document>>;

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Creates the document, or replaces all of its fields.
    async fn set(&self, key: &str, fields: Fields) -> StoreResult<()>;

    /// Creates the document only if the key is free.
    async fn create(&self, key: &str, fields: Fields) -> StoreResult<()>;

    /// Merges `fields` into an existing document.
    async fn update(&self, key: &str, fields: Fields) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Every document in the collection, oldest first.
    async fn stream(&self) -> StoreResult<Vec<Document>>;
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Returns a handle bound to the `items` collection.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using the in-memory document store");
        return Ok(Arc::new(MemoryDocumentStore::new(ITEMS_COLLECTION)));
    };

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    Ok(Arc::new(PgDocumentStore::new(pool, ITEMS_COLLECTION)))
}
