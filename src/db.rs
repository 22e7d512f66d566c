// src/db.rs
use crate::error::{AppError, AppResult};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

pub async fn create_db_pool(database_url: &str) -> AppResult<SqlitePool> {
    tracing::info!("Connecting to database: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));

    // An in-memory database only lives as long as its single connection
    let in_memory = database_url.contains(":memory:");
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations complete.");

    Ok(pool)
}

/// The collections backing the document store, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Accounts,
    Clubs,
    Schedules,
    Complaints,
    Resumes,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Clubs => "clubs",
            Collection::Schedules => "schedules",
            Collection::Complaints => "complaints",
            Collection::Resumes => "resumes",
        }
    }
}

/// A JSON document persisted whole, keyed by an opaque id.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
    /// Name of the field backing `unique_key`, used in conflict messages.
    const UNIQUE_FIELD: &'static str = "id";

    fn id(&self) -> &str;

    /// Case-insensitive unique value enforced by the table (email, club name...).
    fn unique_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn bounded<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::error!("Storage call exceeded {:?}", self.timeout);
                Err(AppError::UpstreamUnavailable(format!(
                    "storage did not answer within {:?}",
                    self.timeout
                )))
            }
        }
    }

    pub async fn find_by_id<D: Document>(&self, id: &str) -> AppResult<Option<D>> {
        let sql = format!("SELECT body FROM {} WHERE id = ?1", D::COLLECTION.table());
        let row: Option<(String,)> = self
            .bounded(sqlx::query_as::<_, (String,)>(&sql).bind(id).fetch_optional(&self.pool))
            .await?;
        row.map(|(body,)| serde_json::from_str(&body).map_err(AppError::from))
            .transpose()
    }

    pub async fn find_by_unique_key<D: Document>(&self, key: &str) -> AppResult<Option<D>> {
        let sql = format!(
            "SELECT body FROM {} WHERE unique_key = ?1 COLLATE NOCASE",
            D::COLLECTION.table()
        );
        let row: Option<(String,)> = self
            .bounded(sqlx::query_as::<_, (String,)>(&sql).bind(key).fetch_optional(&self.pool))
            .await?;
        row.map(|(body,)| serde_json::from_str(&body).map_err(AppError::from))
            .transpose()
    }

    /// All documents of a collection matching `criteria`, in insertion order.
    pub async fn find<D, F>(&self, criteria: F) -> AppResult<Vec<D>>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        let sql = format!("SELECT body FROM {} ORDER BY rowid ASC", D::COLLECTION.table());
        let rows: Vec<(String,)> = self
            .bounded(sqlx::query_as::<_, (String,)>(&sql).fetch_all(&self.pool))
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for (body,) in rows {
            let doc: D = serde_json::from_str(&body)?;
            if criteria(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    pub async fn find_one<D, F>(&self, criteria: F) -> AppResult<Option<D>>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        Ok(self.find(criteria).await?.into_iter().next())
    }

    pub async fn count<D, F>(&self, criteria: F) -> AppResult<usize>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        Ok(self.find::<D, _>(criteria).await?.len())
    }

    /// Inserts a new document; a taken id or unique key is a conflict.
    pub async fn create<D: Document>(&self, doc: &D) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, unique_key, body, updated_at) VALUES (?1, ?2, ?3, ?4)",
            D::COLLECTION.table()
        );
        let body = serde_json::to_string(doc)?;
        let result = self
            .bounded(
                sqlx::query(&sql)
                    .bind(doc.id())
                    .bind(doc.unique_key())
                    .bind(body)
                    .bind(Utc::now().to_rfc3339())
                    .execute(&self.pool),
            )
            .await;
        map_unique_violation::<D>(result, doc)
    }

    /// Inserts `doc` unless its unique key is already taken, in which case the stored
    /// document wins and is returned instead.
    pub async fn create_or_fetch<D: Document>(&self, doc: D) -> AppResult<D> {
        let err = match self.create(&doc).await {
            Ok(()) => return Ok(doc),
            Err(err @ AppError::Conflict { .. }) => err,
            Err(err) => return Err(err),
        };
        let Some(key) = doc.unique_key() else {
            return Err(err);
        };
        match self.find_by_unique_key::<D>(&key).await? {
            Some(stored) => {
                tracing::debug!("{} '{}' created concurrently, using stored copy", D::UNIQUE_FIELD, key);
                Ok(stored)
            }
            None => Err(err),
        }
    }

    /// Upsert by id, replacing the whole document.
    pub async fn save<D: Document>(&self, doc: &D) -> AppResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, unique_key, body, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
               unique_key = excluded.unique_key,
               body = excluded.body,
               updated_at = excluded.updated_at
            "#,
            D::COLLECTION.table()
        );
        let body = serde_json::to_string(doc)?;
        let result = self
            .bounded(
                sqlx::query(&sql)
                    .bind(doc.id())
                    .bind(doc.unique_key())
                    .bind(body)
                    .bind(Utc::now().to_rfc3339())
                    .execute(&self.pool),
            )
            .await;
        map_unique_violation::<D>(result, doc)
    }
}

fn map_unique_violation<D: Document>(
    result: AppResult<sqlx::sqlite::SqliteQueryResult>,
    doc: &D,
) -> AppResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(AppError::SqlxError(sqlx::Error::Database(db_err))) if db_err.is_unique_violation() => {
            let value = doc.unique_key().unwrap_or_else(|| doc.id().to_string());
            tracing::warn!(
                "Unique violation on {}.{} = '{}'",
                D::COLLECTION.table(),
                D::UNIQUE_FIELD,
                value
            );
            Err(AppError::conflict(
                format!("{} '{}' already exists", capitalize(D::UNIQUE_FIELD), value),
                "DUPLICATE_FIELD",
            ))
        }
        Err(e) => Err(e),
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub async fn test_store() -> DocumentStore {
    let pool = create_db_pool("sqlite::memory:")
        .await
        .expect("in-memory database");
    DocumentStore::new(pool, Duration::from_secs(5))
}
