#![allow(dead_code)]
use std::{fmt::Debug, sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use storefront_engine::{
    cache::Cache,
    config::StorefrontConfig,
    db_types::{ExternalId, Role, UserId},
    events::{EventHandlers, EventHooks},
    test_utils::{
        manual_clock::ManualClock,
        prepare_env::{prepare_test_env, random_db_path},
        recording_notifier::RecordingNotifier,
        seed::seed_catalog,
    },
    CartStore,
    CatalogCache,
    OrderLifecycle,
    PriceCache,
    SqliteDatabase,
    StorefrontApi,
    StorefrontDatabase,
    UserManagement,
};

/// Upper bound for waiting on background timers in tests.
pub const TIMER_WAIT: Duration = Duration::from_secs(5);

/// A fully wired storefront over a fresh, seeded SQLite database, with a manual clock and a recording notifier.
pub struct TestSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub cache: Cache,
    pub api: StorefrontApi<SqliteDatabase>,
    pub lifecycle: OrderLifecycle<SqliteDatabase>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: StorefrontConfig,
}

impl Debug for TestSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestSystem({})", self.db_path)
    }
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_hooks(EventHooks::default()).await
    }

    pub async fn with_hooks(hooks: EventHooks) -> Self {
        let db_path = random_db_path();
        prepare_test_env(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        seed_catalog(&db).await;
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()));
        let notifier = Arc::new(RecordingNotifier::default());
        Self::build(db_path, db, hooks, clock, notifier).await
    }

    /// Wires a new system over an existing database, as a process restart would.
    pub async fn restart(&self) -> Self {
        let db = SqliteDatabase::new_with_url(&self.db_path, 5).await.expect("Error reconnecting to database");
        Self::build(self.db_path.clone(), db, EventHooks::default(), self.clock.clone(), self.notifier.clone()).await
    }

    async fn build(
        db_path: String,
        db: SqliteDatabase,
        hooks: EventHooks,
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let config = StorefrontConfig::default();
        let cache = Cache::in_memory(config.cache_op_timeout);
        let prices = PriceCache::new(db.clone(), cache.clone());
        prices.refresh().await.expect("Error warming the price cache");
        let carts = CartStore::new(db.clone(), cache.clone(), prices, config.cart_ttl);
        let catalog = CatalogCache::new(db.clone(), cache.clone(), config.catalog_ttl);
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers();
        let lifecycle =
            OrderLifecycle::new(db.clone(), carts.clone(), notifier.clone(), clock.clone(), producers, &config);
        let api = StorefrontApi::new(db.clone(), catalog, carts);
        Self { db_path, db, cache, api, lifecycle, clock, notifier, config }
    }

    pub async fn client(&self, external: i64) -> UserId {
        self.api.start_session(ExternalId::from(external)).await.expect("Error starting session").user.id
    }

    pub async fn executor(&self, external: i64) -> UserId {
        let external = ExternalId::from(external);
        let (user, _) = self.db.register_user(external, Role::Executor).await.expect("Error registering executor");
        user.id
    }

    pub async fn tear_down(mut self) {
        self.lifecycle.shutdown().await;
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.db_path).await {
            warn!("🚀️ Failed to remove database {}: {e}", self.db_path);
        }
    }
}
