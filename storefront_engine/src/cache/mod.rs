//! # Ephemeral cache
//!
//! Carts, the item price mapping and the per-category catalog listings live in a key/value cache made of hashes
//! (a key maps to a set of field/value pairs) with an optional per-key TTL.
//!
//! The storage itself sits behind the [`CacheBackend`] trait so that hosts can plug in an external cache.
//! [`MemoryCache`] is the in-process implementation. Engine components never talk to a backend directly, but go
//! through a [`Cache`] handle, which bounds every operation with a timeout.
mod memory;

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
pub use memory::MemoryCache;
use thiserror::Error;

use crate::db_types::{CategoryId, UserId};

pub const PRICES_KEY: &str = "prices";

pub fn cart_key(user: UserId) -> String {
    format!("cart:{user}")
}

pub fn category_items_key(category: CategoryId) -> String {
    format!("category:{category}:items")
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("The cache is unavailable: {0}")]
    Unavailable(String),
    #[error("The cache operation timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Reads a single field of a hash. Missing keys and missing fields both give `None`.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    /// Writes a single field of a hash, creating the hash if needed. An existing TTL is kept.
    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError>;

    /// Writes several fields of a hash at once.
    async fn hset_all(&self, key: &str, fields: HashMap<String, String>) -> Result<(), CacheError>;

    /// Reads every field of a hash. A missing key gives an empty map.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError>;

    /// Removes a key. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Sets the time-to-live of a key. Returns `false` if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// Drops every expired key. Returns the number of keys removed.
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

/// A cloneable handle to a cache backend that applies the operation timeout to every call.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    op_timeout: Duration,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, op_timeout: Duration) -> Self {
        Self { backend, op_timeout }
    }

    /// An in-process cache, mostly useful for tests and single-node deployments.
    pub fn in_memory(op_timeout: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::default()), op_timeout)
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    async fn guard<T, F>(&self, fut: F) -> Result<T, CacheError>
    where F: Future<Output = Result<T, CacheError>> + Send {
        tokio::time::timeout(self.op_timeout, fut).await.map_err(|_| CacheError::Timeout(self.op_timeout))?
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.guard(self.backend.hget(key, field)).await
    }

    pub async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError> {
        self.guard(self.backend.hset(key, field, value)).await
    }

    pub async fn hset_all(&self, key: &str, fields: HashMap<String, String>) -> Result<(), CacheError> {
        self.guard(self.backend.hset_all(key, fields)).await
    }

    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.guard(self.backend.hgetall(key)).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.guard(self.backend.delete(key)).await
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.guard(self.backend.expire(key, ttl)).await
    }

    pub async fn purge_expired(&self) -> Result<usize, CacheError> {
        self.guard(self.backend.purge_expired()).await
    }
}
