//! Short-lived key/value state: one-time passwords, their wrong-guess counters and revoked token ids.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use thiserror::Error;
#[cfg(test)]
use {std::collections::HashMap, tokio::sync::Mutex, tokio::time::Instant};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait EphemeralCache: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value, for `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn remove(&self, key: &str) -> Result<(), CacheError>;
    /// Bumps the counter under `key` and returns the new value. The window
    /// of `ttl` starts at the first increment.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError>;
}

/// Redis-backed cache; expiry is delegated to `SET ... EX`.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Opens the shared connection. Clones of the manager reuse it and
    /// reconnect on failure.
    pub async fn connect(client: redis::Client) -> Result<Self, CacheError> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl EphemeralCache for RedisCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await?)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let count = redis::cmd("INCR")
            .arg(key)
            .query_async::<_, u64>(&mut conn)
            .await?;
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(key)
                .arg(ttl.as_secs().max(1))
                .query_async::<_, ()>(&mut conn)
                .await?;
        }
        Ok(count)
    }
}

/// Process-local cache with the same expiry semantics as [`RedisCache`].
#[cfg(test)]
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

#[cfg(test)]
impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl EphemeralCache for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let (count, expires_at) = match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now => {
                (value.parse::<u64>().unwrap_or(0) + 1, *expires_at)
            }
            _ => (1, now + ttl),
        };
        entries.insert(key.to_string(), (count.to_string(), expires_at));
        Ok(count)
    }
}
