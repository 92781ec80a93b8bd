use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;

use crate::cache::{CacheBackend, CacheError};

/// Wraps a cache backend and fails every operation while switched into failing mode.
#[derive(Debug)]
pub struct FlakyCache<C> {
    inner: C,
    failing: AtomicBool,
}

impl<C> FlakyCache<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, failing: AtomicBool::new(false) }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<C: CacheBackend> CacheBackend for FlakyCache<C> {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.check()?;
        self.inner.hget(key, field).await
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError> {
        self.check()?;
        self.inner.hset(key, field, value).await
    }

    async fn hset_all(&self, key: &str, fields: HashMap<String, String>) -> Result<(), CacheError> {
        self.check()?;
        self.inner.hset_all(key, fields).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.check()?;
        self.inner.hgetall(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.check()?;
        self.inner.expire(key, ttl).await
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        self.check()?;
        self.inner.purge_expired().await
    }
}
