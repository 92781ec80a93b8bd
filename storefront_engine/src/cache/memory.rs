use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use log::*;

use crate::cache::{CacheBackend, CacheError};

#[derive(Debug, Default, Clone)]
struct CacheEntry {
    fields: HashMap<String, String>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|t| t <= now).unwrap_or(false)
    }
}

/// An in-process hash cache with per-key expiry.
///
/// Expired keys are invisible to readers straight away and are physically removed either lazily on access or by
/// [`CacheBackend::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_if_expired(&self, key: &str, now: Instant) {
        if self.entries.remove_if(key, |_, e| e.is_expired(now)).is_some() {
            trace!("🧊️ Expired key {key} removed");
        }
    }

    /// Returns a copy of the live entry for `key`, removing it if it has expired.
    fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        let entry = self.entries.get(key).map(|e| e.value().clone())?;
        if entry.is_expired(now) {
            self.drop_if_expired(key, now);
            None
        } else {
            Some(entry)
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        Ok(self.live_entry(key).and_then(|mut e| e.fields.remove(field)))
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_default();
        if entry.is_expired(now) {
            *entry = CacheEntry::default();
        }
        entry.fields.insert(field.to_string(), value);
        Ok(())
    }

    async fn hset_all(&self, key: &str, fields: HashMap<String, String>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_default();
        if entry.is_expired(now) {
            *entry = CacheEntry::default();
        }
        entry.fields.extend(fields);
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        Ok(self.live_entry(key).map(|e| e.fields).unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self.entries.remove(key).map(|(_, e)| !e.is_expired(now)).unwrap_or(false))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let updated = match self.entries.get_mut(key) {
            Some(mut e) if !e.is_expired(now) => {
                e.expires_at = Some(now + ttl);
                true
            },
            _ => false,
        };
        if !updated {
            self.drop_if_expired(key, now);
        }
        Ok(updated)
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!("🧊️ Purged {purged} expired cache keys");
        }
        Ok(purged)
    }
}
