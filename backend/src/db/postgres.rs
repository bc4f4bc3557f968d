use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use super::{Document, DocumentStore, Fields, StoreError, StoreResult};

/// Document store over the `documents` table, one JSONB field map per key.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    collection: String,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    key: String,
    fields: Json<Fields>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            key: row.key,
            fields: row.fields.0,
        }
    }
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT key, fields FROM documents WHERE collection = $1 AND key = $2",
        )
        .bind(&self.collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND key = $2)",
        )
        .bind(&self.collection)
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn set(&self, key: &str, fields: Fields) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, fields)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key)
            DO UPDATE SET fields = EXCLUDED.fields, updated_at = NOW()
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create(&self, key: &str, fields: Fields) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, key, fields)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO NOTHING
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::already_exists(&self.collection, key));
        }
        Ok(())
    }

    async fn update(&self, key: &str, fields: Fields) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET fields     = fields || $3,
                updated_at = NOW()
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(&self.collection)
        .bind(key)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(&self.collection, key));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(&self.collection)
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(&self.collection, key));
        }
        Ok(())
    }

    async fn stream(&self) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT key, fields FROM documents WHERE collection = $1 ORDER BY seq ASC",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }
}
