//! Document store: JSON bodies grouped by collection, backed by Postgres
//! (a single JSONB table) or an in-process map.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A document as it sits in the store.
#[derive(Debug, Clone, FromRow)]
pub struct StoredDocument {
    pub id: Uuid,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DOCUMENT_COLUMNS: &str = "id, body, created_at, updated_at";

#[derive(Clone)]
pub enum DocumentStore {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl DocumentStore {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        DocumentStore::Postgres(PgStore { pool })
    }

    pub fn memory() -> Self {
        DocumentStore::Memory(MemoryStore::default())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DocumentStore::Postgres(_) => "postgres",
            DocumentStore::Memory(_) => "memory",
        }
    }

    /// All documents of a collection in creation order.
    pub async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        match self {
            DocumentStore::Postgres(s) => s.list(collection).await,
            DocumentStore::Memory(s) => Ok(s.list(collection).await),
        }
    }

    pub async fn get(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, StoreError> {
        match self {
            DocumentStore::Postgres(s) => s.get(collection, id).await,
            DocumentStore::Memory(s) => Ok(s.get(collection, id).await),
        }
    }

    pub async fn insert(&self, collection: &str, body: Value) -> Result<StoredDocument, StoreError> {
        match self {
            DocumentStore::Postgres(s) => s.insert(collection, body).await,
            DocumentStore::Memory(s) => Ok(s.insert(collection, body).await),
        }
    }

    /// Replace the body of an existing document. `None` when it does not exist.
    pub async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<StoredDocument>, StoreError> {
        match self {
            DocumentStore::Postgres(s) => s.replace(collection, id, body).await,
            DocumentStore::Memory(s) => Ok(s.replace(collection, id, body).await),
        }
    }

    /// Returns false when nothing was deleted.
    pub async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        match self {
            DocumentStore::Postgres(s) => s.delete(collection, id).await,
            DocumentStore::Memory(s) => Ok(s.delete(collection, id).await),
        }
    }

    /// Number of documents whose top-level string `field` equals `value`.
    pub async fn count_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<i64, StoreError> {
        match self {
            DocumentStore::Postgres(s) => s.count_where(collection, field, value).await,
            DocumentStore::Memory(s) => Ok(s.count_where(collection, field, value).await),
        }
    }

    /// Round-trip latency of a trivial query.
    pub async fn ping(&self) -> Result<Duration, StoreError> {
        let start = std::time::Instant::now();
        if let DocumentStore::Postgres(s) = self {
            sqlx::query("SELECT 1").fetch_one(s.pool.as_ref()).await?;
        }
        Ok(start.elapsed())
    }
}

// ============================================================================
// Postgres
// ============================================================================

#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let query = format!(
            "SELECT {} FROM documents WHERE collection = $1 ORDER BY created_at ASC, id ASC",
            DOCUMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, StoredDocument>(&query)
            .bind(collection)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows)
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        let query = format!(
            "SELECT {} FROM documents WHERE collection = $1 AND id = $2",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, StoredDocument>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row)
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<StoredDocument, StoreError> {
        let query = format!(
            r#"
            INSERT INTO documents (id, collection, body, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, StoredDocument>(&query)
            .bind(Uuid::new_v4())
            .bind(collection)
            .bind(&body)
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(row)
    }

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let query = format!(
            r#"
            UPDATE documents
            SET body = $1, updated_at = now()
            WHERE collection = $2 AND id = $3
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, StoredDocument>(&query)
            .bind(&body)
            .bind(collection)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row)
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_where(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND body ->> $2 = $3",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(count.0)
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Used when no database is configured, and by tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<StoredDocument>>>>,
}

impl MemoryStore {
    async fn list(&self, collection: &str) -> Vec<StoredDocument> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    async fn get(&self, collection: &str, id: Uuid) -> Option<StoredDocument> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
    }

    async fn insert(&self, collection: &str, body: Value) -> StoredDocument {
        let now = Utc::now();
        let doc = StoredDocument {
            id: Uuid::new_v4(),
            body,
            created_at: now,
            updated_at: now,
        };
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        doc
    }

    async fn replace(&self, collection: &str, id: Uuid, body: Value) -> Option<StoredDocument> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)?
            .iter_mut()
            .find(|d| d.id == id)?;
        doc.body = body;
        doc.updated_at = Utc::now();
        Some(doc.clone())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> bool {
        let mut collections = self.collections.write().await;
        match collections.get_mut(collection) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|d| d.id != id);
                docs.len() != before
            }
            None => false,
        }
    }

    async fn count_where(&self, collection: &str, field: &str, value: &str) -> i64 {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.body.get(field).and_then(Value::as_str) == Some(value))
                    .count() as i64
            })
            .unwrap_or(0)
    }
}
