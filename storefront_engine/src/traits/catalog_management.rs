use std::future::Future;

use crate::{
    db_types::{Category, CategoryId, Game, GameId, Item, ItemId},
    traits::StoreError,
};

/// Read access to the catalog. The catalog is populated by an administrative process, so the engine never writes it.
pub trait CatalogManagement {
    /// All games, ordered by id.
    fn fetch_games(&self) -> impl Future<Output = Result<Vec<Game>, StoreError>> + Send;

    /// The categories belonging to `game`, ordered by id.
    fn fetch_categories_for_game(&self, game: GameId)
        -> impl Future<Output = Result<Vec<Category>, StoreError>> + Send;

    fn fetch_category(&self, id: CategoryId) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    /// The items in `category`, ordered by id.
    fn fetch_items_for_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<Vec<Item>, StoreError>> + Send;

    /// Every item in the catalog. Used to rebuild the price mapping.
    fn fetch_all_items(&self) -> impl Future<Output = Result<Vec<Item>, StoreError>> + Send;

    fn fetch_item(&self, id: ItemId) -> impl Future<Output = Result<Option<Item>, StoreError>> + Send;

    /// Resolves the game an item belongs to through its category.
    fn game_for_item(&self, id: ItemId) -> impl Future<Output = Result<Option<GameId>, StoreError>> + Send;
}
