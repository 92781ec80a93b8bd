use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use storefront_common::Amount;

use crate::{
    db_types::{Category, CategoryId, Game, GameId, Item, ItemId},
    traits::{CatalogManagement, StoreError},
};

#[derive(Debug, Default)]
struct CatalogState {
    items: Vec<Item>,
    categories: HashMap<CategoryId, Category>,
    offline: bool,
    item_reads: usize,
}

/// An in-memory catalog. Items are returned in insertion order, and the whole catalog can be taken offline.
#[derive(Debug, Default, Clone)]
pub struct StubCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl StubCatalog {
    /// Items priced as given, all in category 1 of game 1.
    pub fn with_prices(prices: &[(i64, i64)]) -> Self {
        let catalog = Self::default();
        for &(id, price) in prices {
            catalog.add_item(id, 1, 1, &format!("Item {id}"), price);
        }
        catalog
    }

    pub fn add_item(&self, id: i64, category: i64, game: i64, name: &str, price: i64) {
        let mut state = self.state();
        let category_id = CategoryId::from(category);
        state.categories.entry(category_id).or_insert_with(|| Category {
            id: category_id,
            name: format!("Category {category}"),
            game_id: GameId::from(game),
        });
        state.items.push(Item {
            id: ItemId::from(id),
            category_id,
            name: name.to_string(),
            description: None,
            price: Amount::from(price),
        });
    }

    pub fn set_price(&self, id: i64, price: i64) {
        let mut state = self.state();
        if let Some(item) = state.items.iter_mut().find(|i| i.id == ItemId::from(id)) {
            item.price = Amount::from(price);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// How many times the full item list has been read.
    pub fn item_reads(&self) -> usize {
        self.state().item_reads
    }

    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().expect("Catalog state lock poisoned")
    }

    fn online(&self) -> Result<MutexGuard<'_, CatalogState>, StoreError> {
        let state = self.state();
        if state.offline {
            return Err(StoreError::DatabaseError("unable to open database file".into()));
        }
        Ok(state)
    }
}

impl CatalogManagement for StubCatalog {
    async fn fetch_games(&self) -> Result<Vec<Game>, StoreError> {
        let state = self.online()?;
        let mut ids = state.categories.values().map(|c| c.game_id).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        Ok(ids.into_iter().map(|id| Game { id, name: format!("Game {id}") }).collect())
    }

    async fn fetch_categories_for_game(&self, game: GameId) -> Result<Vec<Category>, StoreError> {
        let state = self.online()?;
        let mut categories = state.categories.values().filter(|c| c.game_id == game).cloned().collect::<Vec<_>>();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.online()?.categories.get(&id).cloned())
    }

    async fn fetch_items_for_category(&self, category: CategoryId) -> Result<Vec<Item>, StoreError> {
        Ok(self.online()?.items.iter().filter(|i| i.category_id == category).cloned().collect())
    }

    async fn fetch_all_items(&self) -> Result<Vec<Item>, StoreError> {
        let mut state = self.online()?;
        state.item_reads += 1;
        Ok(state.items.clone())
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.online()?.items.iter().find(|i| i.id == id).cloned())
    }

    async fn game_for_item(&self, id: ItemId) -> Result<Option<GameId>, StoreError> {
        let state = self.online()?;
        let category = state.items.iter().find(|i| i.id == id).map(|i| i.category_id);
        Ok(category.and_then(|c| state.categories.get(&c)).map(|c| c.game_id))
    }
}
