use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tracing::debug;

mod memory;

pub use memory::MemoryStore;

/// Whole-value key/value store. There is no transaction or compare-and-swap
/// across calls: callers that merge into a key must re-read it right before
/// writing.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored values for `keys`. Missing keys are absent from the
    /// returned map.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        (**self).get(keys).await
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()> {
        (**self).set(entries).await
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredKey {
    pub key: String,
    pub size_bytes: usize,
    pub updated_at: DateTime<Utc>,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        // every in-memory connection is its own database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT updated_at FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<DateTime<Utc>, _>(0)))
    }

    pub async fn list_keys(&self) -> Result<Vec<StoredKey>> {
        let rows = sqlx::query("SELECT key, length(value), updated_at FROM kv_entries ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| StoredKey {
                key: r.get::<String, _>(0),
                size_bytes: r.get::<i64, _>(1).max(0) as usize,
                updated_at: r.get::<DateTime<Utc>, _>(2),
            })
            .collect())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let mut values = HashMap::with_capacity(keys.len());
        for key in keys {
            let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
                .bind(*key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("failed to read key '{key}'"))?;
            let Some(row) = row else {
                continue;
            };
            let raw = row.get::<String, _>(0);
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("stored value for key '{key}' is not valid JSON"))?;
            values.insert((*key).to_string(), value);
        }
        Ok(values)
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for (key, value) in &entries {
            sqlx::query(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(serde_json::to_string(value)?)
            .bind(now)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to write key '{key}'"))?;
        }
        tx.commit().await.context("failed to commit key batch")?;
        debug!(keys = entries.len(), "stored key batch");
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
