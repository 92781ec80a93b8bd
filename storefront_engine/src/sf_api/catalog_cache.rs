use std::{collections::HashMap, time::Duration};

use log::*;
use serde::{Deserialize, Serialize};
use storefront_common::Amount;

use crate::{
    cache::{category_items_key, Cache, CacheError},
    db_types::{CategoryId, Item, ItemId},
    traits::{CatalogManagement, StoreError},
};

/// The cached view of an item. The category is implied by the cache key, so it is not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Amount,
}

impl From<&Item> for ItemSnapshot {
    fn from(item: &Item) -> Self {
        Self { id: item.id, name: item.name.clone(), description: item.description.clone(), price: item.price }
    }
}

/// Serves per-category item listings from the cache hash `category:<id>:items`, falling back to the durable store on
/// a miss and repopulating the hash with the catalog TTL.
///
/// A listing may be up to one TTL stale.
#[derive(Clone)]
pub struct CatalogCache<B> {
    db: B,
    cache: Cache,
    ttl: Duration,
}

impl<B> CatalogCache<B> {
    pub fn new(db: B, cache: Cache, ttl: Duration) -> Self {
        Self { db, cache, ttl }
    }

    /// Drops the cached listing for a category so that the next read goes to the durable store.
    pub async fn invalidate(&self, category: CategoryId) -> Result<bool, CacheError> {
        self.cache.delete(&category_items_key(category)).await
    }
}

impl<B> CatalogCache<B>
where B: CatalogManagement
{
    /// The items of a category. Cache hits are sorted by id; store results keep the store order.
    pub async fn items_for_category(&self, category: CategoryId) -> Result<Vec<ItemSnapshot>, StoreError> {
        let key = category_items_key(category);
        match self.cache.hgetall(&key).await {
            Ok(fields) if !fields.is_empty() => match decode_listing(&fields) {
                Some(items) => {
                    trace!("📚️ Catalog cache hit for category {category}");
                    return Ok(items);
                },
                None => warn!("📚️ Cached listing for category {category} is corrupt. Reading from the store."),
            },
            Ok(_) => trace!("📚️ Catalog cache miss for category {category}"),
            Err(e) => warn!("📚️ Could not read the catalog cache for category {category}. {e}"),
        }
        let items = self.db.fetch_items_for_category(category).await?;
        let snapshots = items.iter().map(ItemSnapshot::from).collect::<Vec<_>>();
        if !snapshots.is_empty() {
            if let Err(e) = self.store_listing(&key, &snapshots).await {
                warn!("📚️ Could not cache the listing for category {category}. {e}");
            }
        }
        Ok(snapshots)
    }

    async fn store_listing(&self, key: &str, snapshots: &[ItemSnapshot]) -> Result<(), CacheError> {
        let mut fields = HashMap::with_capacity(snapshots.len());
        for snapshot in snapshots {
            match serde_json::to_string(snapshot) {
                Ok(json) => {
                    fields.insert(snapshot.id.to_string(), json);
                },
                Err(e) => {
                    warn!("📚️ Could not encode item {}. {e}", snapshot.id);
                    return Ok(());
                },
            }
        }
        self.cache.hset_all(key, fields).await?;
        self.cache.expire(key, self.ttl).await?;
        Ok(())
    }
}

/// Decodes every snapshot in the hash. A single undecodable value invalidates the whole listing.
fn decode_listing(fields: &HashMap<String, String>) -> Option<Vec<ItemSnapshot>> {
    let mut items = fields
        .values()
        .map(|json| serde_json::from_str::<ItemSnapshot>(json).ok())
        .collect::<Option<Vec<_>>>()?;
    items.sort_by_key(|i| i.id);
    Some(items)
}
