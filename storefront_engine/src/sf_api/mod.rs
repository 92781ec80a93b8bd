//! # Storefront engine public API
//!
//! The `sf_api` module exposes the programmatic API of the storefront engine.
//!
//! * [`price_cache`] mirrors item prices from the durable store into the cache.
//! * [`catalog_cache`] serves per-category item listings from the cache, falling back to the durable store.
//! * [`cart_store`] holds the per-user cart in the cache.
//! * [`executor_matcher`] attaches a free executor to a paid order.
//! * [`order_lifecycle`] drives every order through its state machine and owns the order timers.
//! * [`storefront_api`] is the browsing facade used by the chat transport.
//!
//! # API usage
//!
//! Every API is created from a store backend that implements [`crate::StorefrontDatabase`] and, where needed, a
//! [`crate::cache::Cache`] handle:
//!
//! ```rust,ignore
//! let db = SqliteDatabase::new_with_url(&url, 5).await?;
//! let cache = Cache::in_memory(config.cache_op_timeout);
//! let prices = PriceCache::new(db.clone(), cache.clone());
//! let carts = CartStore::new(db.clone(), cache.clone(), prices, config.cart_ttl);
//! ```
pub mod cart_store;
pub mod catalog_cache;
pub mod errors;
pub mod executor_matcher;
pub mod order_lifecycle;
pub mod order_timers;
pub mod price_cache;
pub mod storefront_api;
