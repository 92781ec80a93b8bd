//! Catalog queries, and the write helpers used to seed a catalog.
use sqlx::SqliteConnection;

use super::returned_row;
use crate::db_types::{Category, CategoryId, Game, GameId, Item, ItemId};

pub async fn fetch_games(conn: &mut SqliteConnection) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM games ORDER BY id").fetch_all(conn).await
}

pub async fn fetch_categories_for_game(
    game: GameId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM categories WHERE game_id = $1 ORDER BY id").bind(game).fetch_all(conn).await
}

pub async fn fetch_category(id: CategoryId, conn: &mut SqliteConnection) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_items_for_category(
    category: CategoryId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM items WHERE category_id = $1 ORDER BY id").bind(category).fetch_all(conn).await
}

pub async fn fetch_all_items(conn: &mut SqliteConnection) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM items ORDER BY id").fetch_all(conn).await
}

pub async fn fetch_item(id: ItemId, conn: &mut SqliteConnection) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM items WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn game_for_item(id: ItemId, conn: &mut SqliteConnection) -> Result<Option<GameId>, sqlx::Error> {
    let game: Option<(GameId,)> = sqlx::query_as(
        r#"
        SELECT categories.game_id FROM items
        JOIN categories ON categories.id = items.category_id
        WHERE items.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(game.map(|(g,)| g))
}

/// Inserts a game. Only the catalog seeding tools use the write helpers in this module.
pub async fn insert_game(name: &str, conn: &mut SqliteConnection) -> Result<Game, sqlx::Error> {
    let rows = sqlx::query_as("INSERT INTO games (name) VALUES ($1) RETURNING *").bind(name).fetch_all(conn).await?;
    returned_row(rows)
}

pub async fn insert_category(name: &str, game: GameId, conn: &mut SqliteConnection) -> Result<Category, sqlx::Error> {
    let rows = sqlx::query_as("INSERT INTO categories (name, game_id) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(game)
        .fetch_all(conn)
        .await?;
    returned_row(rows)
}

pub async fn insert_item(
    category: CategoryId,
    name: &str,
    description: Option<&str>,
    price: i64,
    conn: &mut SqliteConnection,
) -> Result<Item, sqlx::Error> {
    let rows = sqlx::query_as(
        "INSERT INTO items (category_id, name, description, price) VALUES ($1, $2, $3, $4) RETURNING *",
    )
        .bind(category)
        .bind(name)
        .bind(description)
        .bind(price)
        .fetch_all(conn)
        .await?;
    returned_row(rows)
}

/// Administrative price change. The price cache must be refreshed afterwards.
pub async fn update_item_price(
    id: ItemId,
    price: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Item>, sqlx::Error> {
    let mut rows = sqlx::query_as("UPDATE items SET price = $1 WHERE id = $2 RETURNING *")
        .bind(price)
        .bind(id)
        .fetch_all(conn)
        .await?;
    Ok(rows.pop())
}
