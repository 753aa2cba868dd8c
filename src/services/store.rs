//! Counter storage backends.
//!
//! The limiter only needs string get/put with a TTL, so the trait mirrors a
//! KV namespace rather than a counter API. Counter semantics (parse,
//! compare, increment) stay in the rate limiter.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

use crate::config::RedisConfig;

/// Keyed string storage with per-entry expiry.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Fetch a live entry. Expired and absent keys both read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;

    /// Overwrite an entry and restart its TTL.
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), anyhow::Error>;

    /// Verify the backend answers.
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

/// Redis-backed store used in deployment.
#[derive(Clone)]
pub struct RedisCounterStore {
    manager: ConnectionManager,
}

impl RedisCounterStore {
    pub async fn connect(config: &RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read counter {}: {}", key, e))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write counter {}: {}", key, e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-memory store for tests and local runs without Redis.
///
/// Entries record the TTL they were written with so tests can assert on it;
/// expiry is simulated against `Instant::now()` at read time.
pub struct MemoryCounterStore {
    pub entries: Mutex<HashMap<String, StoredEntry>>,
}

#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub value: String,
    pub ttl_seconds: u64,
    pub expires_at: Instant,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Store mutex poisoned: {}", e))?;

        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), anyhow::Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("Store mutex poisoned: {}", e))?;

        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                ttl_seconds,
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
