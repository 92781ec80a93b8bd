use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Category, CategoryId, ExternalId, Game, GameId, ItemId, OrderId, Role, User, UserId},
    sf_api::{
        cart_store::{CartLine, CartStore, CartUpdate},
        catalog_cache::{CatalogCache, ItemSnapshot},
        errors::ApiError,
    },
    traits::StorefrontDatabase,
};

/// The outcome of a client opening a session with `/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    pub user: User,
    /// `true` if the user was registered by this call.
    pub is_new: bool,
    /// `true` if the client must finish an existing order before browsing.
    pub has_active_order: bool,
}

/// `StorefrontApi` is the browsing facade used by the chat transport.
///
/// It registers users, serves the catalog, and maintains the cart. While a client has an order that is not completed
/// or cancelled, browsing is refused with [`ApiError::ActiveOrderExists`]. A cart only ever holds items of one game:
/// moving to another game empties it.
pub struct StorefrontApi<B> {
    db: B,
    catalog: CatalogCache<B>,
    carts: CartStore<B>,
}

impl<B> Debug for StorefrontApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorefrontApi")
    }
}

impl<B> StorefrontApi<B> {
    pub fn new(db: B, catalog: CatalogCache<B>, carts: CartStore<B>) -> Self {
        Self { db, catalog, carts }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn carts(&self) -> &CartStore<B> {
        &self.carts
    }
}

impl<B> StorefrontApi<B>
where B: StorefrontDatabase
{
    /// Registers a new client, or welcomes back a returning one with an empty cart.
    pub async fn start_session(&self, external_id: ExternalId) -> Result<SessionStart, ApiError> {
        let (user, is_new) = self.db.register_user(external_id, Role::Client).await?;
        if is_new {
            info!("🛍️ New client {external_id} registered as user {}", user.id);
        } else {
            self.clear_cart_quietly(user.id).await;
        }
        let has_active_order = self.db.has_active_order(user.id).await?;
        Ok(SessionStart { user, is_new, has_active_order })
    }

    /// Registers the user as an executor. An existing user keeps their role.
    pub async fn register_executor(&self, external_id: ExternalId) -> Result<(User, bool), ApiError> {
        let (user, is_new) = self.db.register_user(external_id, Role::Executor).await?;
        if is_new {
            info!("🛍️ Executor {external_id} registered as user {}", user.id);
        } else if !user.is_executor() {
            warn!("🛍️ User {external_id} is already registered as a {} and was not promoted", user.role);
        }
        Ok((user, is_new))
    }

    /// The registered user behind a chat identity.
    pub async fn user(&self, external_id: ExternalId) -> Result<User, ApiError> {
        self.db.fetch_user_by_external_id(external_id).await?.ok_or(ApiError::UserNotRegistered(external_id))
    }

    /// The chat identity of a user.
    pub async fn external_id_of(&self, user: UserId) -> Result<ExternalId, ApiError> {
        let user = self.db.fetch_user(user).await?.ok_or(ApiError::UserNotFound(user))?;
        Ok(user.external_id)
    }

    /// The chat identity of the executor assigned to an order, if any.
    pub async fn executor_external_id(&self, order: OrderId) -> Result<Option<ExternalId>, ApiError> {
        let order = self.db.fetch_order(order).await?.ok_or(ApiError::OrderNotFound(order))?;
        match order.executor_id {
            Some(executor) => Ok(Some(self.external_id_of(executor).await?)),
            None => Ok(None),
        }
    }

    pub async fn browse_games(&self, client: UserId) -> Result<Vec<Game>, ApiError> {
        self.ensure_no_active_order(client).await?;
        Ok(self.db.fetch_games().await?)
    }

    pub async fn browse_categories(&self, client: UserId, game: GameId) -> Result<Vec<Category>, ApiError> {
        self.ensure_no_active_order(client).await?;
        let categories = self.db.fetch_categories_for_game(game).await?;
        if categories.is_empty() && !self.db.fetch_games().await?.iter().any(|g| g.id == game) {
            return Err(ApiError::GameNotFound(game));
        }
        self.switch_game(client, game).await?;
        Ok(categories)
    }

    pub async fn browse_items(&self, client: UserId, category: CategoryId) -> Result<Vec<ItemSnapshot>, ApiError> {
        self.ensure_no_active_order(client).await?;
        let category = self.db.fetch_category(category).await?.ok_or(ApiError::CategoryNotFound(category))?;
        self.switch_game(client, category.game_id).await?;
        Ok(self.catalog.items_for_category(category.id).await?)
    }

    /// Adds one unit of the item to the cart and returns the new quantity and the running total.
    pub async fn add_item(&self, client: UserId, item: ItemId) -> Result<CartUpdate, ApiError> {
        if !item.is_valid() {
            return Err(ApiError::Validation(format!("{item} is not a valid item id")));
        }
        self.ensure_no_active_order(client).await?;
        let game = self.db.game_for_item(item).await?.ok_or(ApiError::ItemNotFound(item))?;
        self.switch_game(client, game).await?;
        let quantity = self.carts.add(client, item, 1).await?;
        let total = self.carts.total_amount(client).await;
        Ok(CartUpdate { item_id: item, quantity, total })
    }

    pub async fn reset_cart(&self, client: UserId) -> Result<(), ApiError> {
        Ok(self.carts.clear(client).await?)
    }

    /// Leaving the catalog discards the cart.
    pub async fn return_to_menu(&self, client: UserId) -> Result<(), ApiError> {
        debug!("🛍️ Client {client} returned to the main menu");
        self.reset_cart(client).await
    }

    /// The cart, line by line, for display.
    pub async fn cart_lines(&self, client: UserId) -> Result<Vec<CartLine>, ApiError> {
        let mut lines = Vec::new();
        for (item_id, quantity) in self.carts.entries(client).await {
            let Some(item) = self.db.fetch_item(item_id).await? else {
                warn!("🛍️ Item {item_id} in the cart of client {client} no longer exists");
                continue;
            };
            let category_name =
                self.db.fetch_category(item.category_id).await?.map(|c| c.name).unwrap_or_default();
            let unit_price = match self.carts.prices().lookup_or_refresh(item_id).await {
                Ok(Some(price)) => price,
                Ok(None) => item.price,
                Err(e) => {
                    warn!("🛍️ Could not read the cached price of item {item_id}. {e}");
                    item.price
                },
            };
            lines.push(CartLine {
                item_id,
                item_name: item.name,
                category_name,
                quantity,
                unit_price,
                line_total: unit_price * quantity,
            });
        }
        Ok(lines)
    }

    async fn ensure_no_active_order(&self, client: UserId) -> Result<(), ApiError> {
        if self.db.has_active_order(client).await? {
            debug!("🛍️ Client {client} has an active order. Browsing refused.");
            return Err(ApiError::ActiveOrderExists(client));
        }
        Ok(())
    }

    /// Empties the cart if it holds items of a game other than `game`.
    async fn switch_game(&self, client: UserId, game: GameId) -> Result<(), ApiError> {
        if let Some(current) = self.carts.game_id(client).await? {
            if current != game {
                info!("🛍️ Client {client} switched from game {current} to {game}. The cart is cleared.");
                self.carts.clear(client).await?;
            }
        }
        Ok(())
    }

    async fn clear_cart_quietly(&self, client: UserId) {
        if let Err(e) = self.carts.clear(client).await {
            warn!("🛍️ Could not clear the cart of client {client}. {e}");
        }
    }
}
