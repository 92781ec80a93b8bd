use std::sync::Arc;

use log::*;
use storefront_engine::{
    cache::Cache,
    clock::SystemClock,
    events::{EventHandlers, EventHooks},
    CartStore,
    CatalogCache,
    OrderLifecycle,
    PriceCache,
    SqliteDatabase,
    StorefrontApi,
    StorefrontDatabase,
};

use crate::{config::ServerConfig, errors::ServerError, janitor::start_cache_janitor, notifier::LogNotifier};

/// The engine components, wired together and ready to serve a chat transport.
pub struct Storefront {
    pub db: SqliteDatabase,
    pub cache: Cache,
    pub api: StorefrontApi<SqliteDatabase>,
    pub lifecycle: OrderLifecycle<SqliteDatabase>,
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let storefront = create_storefront(&config, db, audit_hooks()).await?;
    let resumed = storefront.lifecycle.resume_timers().await?;
    info!("🚀️ Storefront ready. {resumed} order timers resumed.");
    let janitor = start_cache_janitor(storefront.cache.clone(), config.storefront.cache_janitor_interval);

    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutting down");
    janitor.abort();
    let Storefront { mut db, lifecycle, .. } = storefront;
    lifecycle.shutdown().await;
    db.close().await?;
    Ok(())
}

/// Builds the engine over an open database. The price cache is warmed before anything else is served.
pub async fn create_storefront(
    config: &ServerConfig,
    db: SqliteDatabase,
    hooks: EventHooks,
) -> Result<Storefront, ServerError> {
    let settings = &config.storefront;
    let cache = Cache::in_memory(settings.cache_op_timeout);
    let prices = PriceCache::new(db.clone(), cache.clone());
    let count = prices.refresh().await?;
    info!("💲️ Price cache warmed with {count} items");
    let carts = CartStore::new(db.clone(), cache.clone(), prices, settings.cart_ttl);
    let catalog = CatalogCache::new(db.clone(), cache.clone(), settings.catalog_ttl);

    let handlers = EventHandlers::new(128, hooks);
    let producers = handlers.producers();
    handlers.start_handlers();

    let lifecycle = OrderLifecycle::new(
        db.clone(),
        carts.clone(),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
        producers,
        settings,
    );
    let api = StorefrontApi::new(db.clone(), catalog, carts);
    Ok(Storefront { db, cache, api, lifecycle })
}

/// Hooks that write every order event to the audit log.
pub fn audit_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|ev| {
        Box::pin(async move {
            let order = ev.order;
            info!(
                target: "storefront::audit",
                "📬️ Order #{} created by user {} for {}. Payment due by {}",
                order.id, order.client_id, order.total_amount, order.payment_deadline
            );
        })
    });
    hooks.on_status_changed(|ev| {
        Box::pin(async move {
            info!(
                target: "storefront::audit",
                "📬️ Order #{} moved from {} to {}. Executor: {:?}",
                ev.order.id,
                ev.old_status,
                ev.new_status(),
                ev.order.executor_id
            );
        })
    });
    hooks
}
