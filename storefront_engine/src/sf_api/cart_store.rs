use std::{collections::HashMap, time::Duration};

use log::*;
use serde::{Deserialize, Serialize};
use storefront_common::Amount;
use thiserror::Error;

use crate::{
    cache::{cart_key, Cache, CacheError},
    config::MAX_ITEM_QUANTITY,
    db_types::{GameId, ItemId, UserId},
    sf_api::price_cache::PriceCache,
    traits::{CatalogManagement, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Invalid cart request: {0}")]
    Validation(String),
    #[error("The cart is unavailable: {0}")]
    Cache(#[from] CacheError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Item {0} does not exist")]
    ItemNotFound(ItemId),
}

impl CartError {
    pub fn user_message(&self) -> String {
        match self {
            CartError::Validation(_) => "That request is not valid.".into(),
            CartError::ItemNotFound(_) => "That product is no longer available.".into(),
            CartError::Cache(_) | CartError::Store(_) => {
                "Your cart is temporarily unavailable. Please try again later.".into()
            },
        }
    }
}

/// The result of adding an item to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub item_id: ItemId,
    pub quantity: u32,
    /// Running cart total, for display only.
    pub total: Amount,
}

/// A cart line ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub category_name: String,
    pub quantity: u32,
    pub unit_price: Amount,
    pub line_total: Amount,
}

/// The per-user cart, kept in the cache hash `cart:<user>` (item id to quantity).
///
/// The whole cart expires after an idle TTL, which is refreshed on every addition. Quantities are clamped to
/// [`MAX_ITEM_QUANTITY`].
#[derive(Clone)]
pub struct CartStore<B> {
    db: B,
    cache: Cache,
    prices: PriceCache<B>,
    ttl: Duration,
}

impl<B> CartStore<B> {
    pub fn new(db: B, cache: Cache, prices: PriceCache<B>, ttl: Duration) -> Self {
        Self { db, cache, prices, ttl }
    }

    pub fn prices(&self) -> &PriceCache<B> {
        &self.prices
    }

    /// Adds `qty` units of `item`. The stored quantity is clamped to the cap rather than rejected.
    ///
    /// Cache failures are returned to the caller, since the client would otherwise believe the item was added.
    pub async fn add(&self, user: UserId, item: ItemId, qty: u32) -> Result<u32, CartError> {
        if qty == 0 {
            return Err(CartError::Validation("quantity must be at least 1".into()));
        }
        if !user.is_valid() || !item.is_valid() {
            return Err(CartError::Validation(format!("invalid cart entry ({user}, {item})")));
        }
        let key = cart_key(user);
        let field = item.to_string();
        let current = self.cache.hget(&key, &field).await?.map(|v| parse_quantity(&key, &v)).unwrap_or(0);
        let quantity = current.saturating_add(qty).min(MAX_ITEM_QUANTITY);
        self.cache.hset(&key, &field, quantity.to_string()).await?;
        self.cache.expire(&key, self.ttl).await?;
        debug!("🛒️ Cart of user {user}: item {item} x{quantity}");
        Ok(quantity)
    }

    /// The quantity of `item` in the cart. Failures and malformed values count as zero.
    pub async fn quantity(&self, user: UserId, item: ItemId) -> u32 {
        let key = cart_key(user);
        match self.cache.hget(&key, &item.to_string()).await {
            Ok(value) => value.map(|v| parse_quantity(&key, &v)).unwrap_or(0),
            Err(e) => {
                warn!("🛒️ Could not read {key}. {e}");
                0
            },
        }
    }

    /// Removes the whole cart. Clearing an empty cart succeeds.
    pub async fn clear(&self, user: UserId) -> Result<(), CartError> {
        let existed = self.cache.delete(&cart_key(user)).await?;
        trace!("🛒️ Cart of user {user} cleared (existed: {existed})");
        Ok(())
    }

    /// Every (item, quantity) pair with a positive quantity, ordered by item id.
    pub async fn try_entries(&self, user: UserId) -> Result<Vec<(ItemId, u32)>, CacheError> {
        let key = cart_key(user);
        let raw = self.cache.hgetall(&key).await?;
        let mut entries = raw
            .iter()
            .filter_map(|(k, v)| match k.parse::<ItemId>() {
                Ok(item) => Some((item, parse_quantity(&key, v))),
                Err(_) => {
                    warn!("🛒️ Ignoring malformed item id '{k}' in {key}");
                    None
                },
            })
            .filter(|(_, q)| *q > 0)
            .collect::<Vec<_>>();
        entries.sort_by_key(|(item, _)| *item);
        Ok(entries)
    }

    /// Like [`Self::try_entries`], but a cache failure gives an empty cart.
    pub async fn entries(&self, user: UserId) -> Vec<(ItemId, u32)> {
        self.try_entries(user).await.unwrap_or_else(|e| {
            warn!("🛒️ Could not read the cart of user {user}. {e}");
            Vec::new()
        })
    }
}

impl<B> CartStore<B>
where B: CatalogManagement
{
    /// The running cart total from cached prices, for display.
    ///
    /// The price mapping is refreshed once if it is empty or lacks a price. Items that still have no price are skipped
    /// with a warning.
    pub async fn total_amount(&self, user: UserId) -> Amount {
        let entries = self.entries(user).await;
        if entries.is_empty() {
            return Amount::default();
        }
        let mut prices = self.cached_prices().await;
        if prices.is_empty() || entries.iter().any(|(item, _)| !prices.contains_key(item)) {
            match self.prices.refresh().await {
                Ok(_) => prices = self.cached_prices().await,
                Err(e) => warn!("🛒️ Could not refresh prices for the cart total. {e}"),
            }
        }
        entries
            .into_iter()
            .filter_map(|(item, qty)| match prices.get(&item) {
                Some(price) => Some(*price * qty),
                None => {
                    warn!("🛒️ No price for item {item}. It is left out of the cart total.");
                    None
                },
            })
            .sum()
    }

    async fn cached_prices(&self) -> HashMap<ItemId, Amount> {
        self.prices.all_prices().await.unwrap_or_else(|e| {
            warn!("🛒️ Could not read cached prices. {e}");
            HashMap::new()
        })
    }

    /// The cart total priced from the durable store. Orders are always created from this value.
    ///
    /// Unlike [`Self::total_amount`], nothing is skipped: an item that no longer exists is an error.
    pub async fn authoritative_total(&self, user: UserId) -> Result<Amount, CartError> {
        let entries = self.try_entries(user).await?;
        let mut total = Amount::default();
        for (item_id, qty) in entries {
            let item = self.db.fetch_item(item_id).await?.ok_or(CartError::ItemNotFound(item_id))?;
            total += item.price * qty;
        }
        Ok(total)
    }

    /// The game shared by every item in the cart. An empty cart, or one that mixes games, has none.
    pub async fn game_id(&self, user: UserId) -> Result<Option<GameId>, CartError> {
        let mut game = None;
        for (item, _) in self.entries(user).await {
            let item_game = self.db.game_for_item(item).await?;
            match (game, item_game) {
                (_, None) => return Ok(None),
                (None, Some(g)) => game = Some(g),
                (Some(g), Some(h)) if g != h => return Ok(None),
                _ => {},
            }
        }
        Ok(game)
    }
}

fn parse_quantity(key: &str, value: &str) -> u32 {
    value.trim().parse::<u32>().unwrap_or_else(|_| {
        warn!("🛒️ Ignoring malformed quantity '{value}' in {key}");
        0
    })
}
