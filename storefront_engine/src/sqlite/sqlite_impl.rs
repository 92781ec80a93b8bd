//! `SqliteDatabase` is the concrete durable store of the storefront engine.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{catalog, db_url, new_pool, orders, users};
use crate::{
    db_types::{
        Category,
        CategoryId,
        ExternalId,
        Game,
        GameId,
        Item,
        ItemId,
        NewOrder,
        Order,
        OrderId,
        OrderStatusType,
        Role,
        User,
        UserId,
    },
    traits::{AssignOutcome, CatalogManagement, OrderManagement, StoreError, StorefrontDatabase, UserManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the `SF_DATABASE_URL` environment variable (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, StoreError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        trace!("🗃️ Creating new database connection pool for {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_games(&self) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_games(&mut conn).await?)
    }

    async fn fetch_categories_for_game(&self, game: GameId) -> Result<Vec<Category>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_categories_for_game(game, &mut conn).await?)
    }

    async fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_category(id, &mut conn).await?)
    }

    async fn fetch_items_for_category(&self, category: CategoryId) -> Result<Vec<Item>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_items_for_category(category, &mut conn).await?)
    }

    async fn fetch_all_items(&self) -> Result<Vec<Item>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_all_items(&mut conn).await?)
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_item(id, &mut conn).await?)
    }

    async fn game_for_item(&self, id: ItemId) -> Result<Option<GameId>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::game_for_item(id, &mut conn).await?)
    }
}

impl UserManagement for SqliteDatabase {
    async fn register_user(&self, external_id: ExternalId, role: Role) -> Result<(User, bool), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = users::idempotent_insert(external_id, role, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(id, &mut conn).await?)
    }

    async fn fetch_user_by_external_id(&self, external_id: ExternalId) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_external_id(external_id, &mut conn).await?)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} has been saved in the DB", order.id);
        Ok(order)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(id, &mut conn).await?)
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> Result<Order, StoreError> {
        if !expected.can_transition_to(new_status) {
            return Err(StoreError::IllegalTransition { order: id, from: expected, to: new_status });
        }
        let mut tx = self.pool.begin().await?;
        let result = match orders::cas_status(id, expected, new_status, &mut tx).await? {
            Some(order) => {
                debug!("🗃️ Order #{id} moved from {expected} to {new_status}");
                Ok(order)
            },
            None => {
                let err = orders::explain_failed_transition(id, new_status, &mut tx).await?;
                debug!("🗃️ Status update for order #{id} did not apply. {err}");
                Err(err)
            },
        };
        tx.commit().await?;
        result
    }

    async fn set_payment_confirmed(&self, id: OrderId) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        if let Some(order) = orders::cas_payment_confirmed(id, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Client confirmed payment for order #{id}");
            return Ok(order);
        }
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(StoreError::OrderNotFound(id))?;
        tx.commit().await?;
        if order.payment_confirmed_by_user {
            Err(StoreError::PaymentAlreadyConfirmed(id))
        } else {
            Err(StoreError::OrderNotPending(id, order.status))
        }
    }

    async fn has_active_order(&self, client: UserId) -> Result<bool, StoreError> {
        Ok(self.fetch_active_order(client).await?.is_some())
    }

    async fn fetch_active_order(&self, client: UserId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_active_order(client, &mut conn).await?)
    }

    async fn fetch_orders_by_status(&self, status: OrderStatusType) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_by_status(status, &mut conn).await?)
    }

    async fn assign_free_executor(&self, id: OrderId) -> Result<AssignOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        let outcome = match orders::cas_assign_free_executor(id, &mut tx).await? {
            Some(order) => {
                info!("🗃️ Order #{id} assigned to executor {:?}", order.executor_id);
                AssignOutcome::Assigned(order)
            },
            None => orders::explain_failed_assignment(id, &mut tx).await?,
        };
        tx.commit().await?;
        Ok(outcome)
    }
}
