//! Storefront Engine
//!
//! The storefront engine is the core of a chat-driven shop for digital goods (game currency top-ups). Clients browse
//! a catalog, fill a cart, place an order, pay out-of-band, and are matched with a human executor who fulfils it.
//!
//! The library is divided into the following sections:
//! 1. Durable storage ([`mod@traits`] and the `sqlite` backend). The traits describe what a storage backend must
//!    provide. [`SqliteDatabase`] is the shipped implementation. The data types used in the database live in
//!    [`mod@db_types`] and are public.
//! 2. The ephemeral cache ([`mod@cache`]). Carts, price mappings and catalog listings live here, behind the
//!    [`cache::CacheBackend`] trait, with an in-process [`cache::MemoryCache`] implementation.
//! 3. The public API ([`mod@sf_api`]). [`PriceCache`], [`CatalogCache`] and [`CartStore`] serve the browsing flow,
//!    [`StorefrontApi`] is the facade the chat transport talks to, and [`OrderLifecycle`] drives every order from
//!    creation to its terminal status, including the payment watchdog and the executor retry timer.
//!
//! The engine also emits events when orders are created or change status. Hook into them with
//! [`events::EventHooks`].
pub mod cache;
pub mod clock;
pub mod config;
pub mod db_types;
pub mod events;
pub mod notifier;
mod sf_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sf_api::{
    cart_store::{CartError, CartLine, CartStore, CartUpdate},
    catalog_cache::{CatalogCache, ItemSnapshot},
    errors::{ApiError, LifecycleError},
    executor_matcher::ExecutorMatcher,
    order_lifecycle::{OrderLifecycle, PaymentConfirmation},
    order_timers::{OrderTimers, TimerKind},
    price_cache::{PriceCache, PriceCacheError},
    storefront_api::{SessionStart, StorefrontApi},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use storefront_common::Amount;
pub use traits::{
    AssignOutcome,
    CatalogManagement,
    OrderManagement,
    StoreError,
    StorefrontDatabase,
    UserManagement,
};
