use std::collections::HashMap;

use log::*;
use storefront_common::Amount;
use thiserror::Error;

use crate::{
    cache::{Cache, CacheError, PRICES_KEY},
    db_types::ItemId,
    traits::{CatalogManagement, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum PriceCacheError {
    #[error("Prices cannot be read from the durable store: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Price cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Mirrors authoritative item prices from the durable store into the cache hash `prices` (item id to price).
///
/// The mirror is rebuilt on demand. Prices are never computed without a successful store read.
#[derive(Clone)]
pub struct PriceCache<B> {
    db: B,
    cache: Cache,
}

impl<B> PriceCache<B> {
    pub fn new(db: B, cache: Cache) -> Self {
        Self { db, cache }
    }
}

impl<B> PriceCache<B>
where B: CatalogManagement
{
    /// Replaces the cached mapping with the current prices from the durable store.
    ///
    /// The old mapping is deleted before the new one is written, so readers may briefly see an empty mapping. If the
    /// item table is empty, the cache is left untouched. Returns the number of prices written.
    pub async fn refresh(&self) -> Result<usize, PriceCacheError> {
        let items = self.db.fetch_all_items().await?;
        if items.is_empty() {
            warn!("💲️ The item table is empty. The price cache was left untouched.");
            return Ok(0);
        }
        let prices = items.iter().map(|i| (i.id.to_string(), i.price.value().to_string())).collect::<HashMap<_, _>>();
        let count = prices.len();
        self.cache.delete(PRICES_KEY).await?;
        self.cache.hset_all(PRICES_KEY, prices).await?;
        info!("💲️ Price cache refreshed with {count} prices");
        Ok(count)
    }

    /// Reads the cached price of an item. Missing and malformed values both give `None`.
    pub async fn lookup(&self, item: ItemId) -> Result<Option<Amount>, PriceCacheError> {
        let value = self.cache.hget(PRICES_KEY, &item.to_string()).await?;
        Ok(value.and_then(|v| parse_price(item, &v)))
    }

    /// Like [`Self::lookup`], but refreshes the mapping once and retries if the price is not cached.
    pub async fn lookup_or_refresh(&self, item: ItemId) -> Result<Option<Amount>, PriceCacheError> {
        if let Some(price) = self.lookup(item).await? {
            return Ok(Some(price));
        }
        debug!("💲️ No cached price for item {item}. Refreshing the price cache.");
        self.refresh().await?;
        self.lookup(item).await
    }

    /// Every well-formed price currently in the cache.
    pub async fn all_prices(&self) -> Result<HashMap<ItemId, Amount>, PriceCacheError> {
        let raw = self.cache.hgetall(PRICES_KEY).await?;
        let prices = raw
            .into_iter()
            .filter_map(|(k, v)| match k.parse::<ItemId>() {
                Ok(item) => parse_price(item, &v).map(|p| (item, p)),
                Err(_) => {
                    warn!("💲️ Ignoring malformed price cache key '{k}'");
                    None
                },
            })
            .collect();
        Ok(prices)
    }
}

fn parse_price(item: ItemId, value: &str) -> Option<Amount> {
    match value.trim().parse::<i64>() {
        Ok(p) if p > 0 => Some(Amount::from(p)),
        _ => {
            warn!("💲️ Ignoring malformed cached price '{value}' for item {item}");
            None
        },
    }
}
