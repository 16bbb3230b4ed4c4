//! Key-value cache collaborator
//!
//! Holds short-lived throttle keys and materialized JSON lists. Nothing
//! stored here is authoritative; callers fall back to redb on a miss.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::Result;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Set a value that expires after `ttl_secs`
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;

    /// Round-trip check used by the health route
    async fn ping(&self) -> Result<()>;
}

impl dyn Cache {
    /// Read a JSON value; `None` when the key is absent
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }
}

// =============================================================================
// Redis
// =============================================================================

/// Cache backed by Redis through a reconnecting connection manager
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        tracing::info!("Connecting to Redis...");

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager().await?;

        tracing::info!("Redis connection established");

        Ok(Self { connection })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// =============================================================================
// In-process
// =============================================================================

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// Process-local cache used when no Redis URL is configured, and in tests
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_cache_get_set_del() {
        let cache = MemoryCache::new();

        assert_eq!(cache.get("missing").await.unwrap(), None);

        cache.set("k", "v").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        cache.del("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_cache_expiry() {
        let cache = MemoryCache::new();
        cache.set_ex("friendNotification:2:1", "true", 1800).await.unwrap();

        tokio::time::advance(Duration::from_secs(1799)).await;
        assert!(cache.get("friendNotification:2:1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("friendNotification:2:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

        cache.set_json("list", &vec![1u64, 2, 3]).await.unwrap();
        let list: Option<Vec<u64>> = cache.get_json("list").await.unwrap();
        assert_eq!(list, Some(vec![1, 2, 3]));

        let missing: Option<Vec<u64>> = cache.get_json("nope").await.unwrap();
        assert!(missing.is_none());

        cache.set("broken", "{not json").await.unwrap();
        assert!(cache.get_json::<Vec<u64>>("broken").await.is_err());
    }
}
