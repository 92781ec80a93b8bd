//! A small, fixed demo catalog.
//!
//! | game | category | item | price |
//! |---|---|---|---|
//! | 1 Genshin Impact | 1 Genesis Crystals | 1 60 Genesis Crystals | 100 |
//! | | | 2 330 Genesis Crystals | 250 |
//! | | 2 Welkin Moon | 3 Blessing of the Welkin Moon | 400 |
//! | 2 Honkai: Star Rail | 3 Oneiric Shards | 4 60 Oneiric Shards | 90 |
//! | | | 5 300 Oneiric Shards | 380 |
use log::*;

use crate::{sqlite_db::catalog, SqliteDatabase};

pub async fn seed_catalog(db: &SqliteDatabase) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring a connection");
    let genshin = catalog::insert_game("Genshin Impact", &mut conn).await.expect("Error inserting game");
    let star_rail = catalog::insert_game("Honkai: Star Rail", &mut conn).await.expect("Error inserting game");
    let crystals =
        catalog::insert_category("Genesis Crystals", genshin.id, &mut conn).await.expect("Error inserting category");
    let welkin =
        catalog::insert_category("Welkin Moon", genshin.id, &mut conn).await.expect("Error inserting category");
    let shards =
        catalog::insert_category("Oneiric Shards", star_rail.id, &mut conn).await.expect("Error inserting category");
    let items = [
        (crystals.id, "60 Genesis Crystals", None, 100),
        (crystals.id, "330 Genesis Crystals", Some("Best value"), 250),
        (welkin.id, "Blessing of the Welkin Moon", Some("90 Genesis Crystals a day for 30 days"), 400),
        (shards.id, "60 Oneiric Shards", None, 90),
        (shards.id, "300 Oneiric Shards", None, 380),
    ];
    for (category, name, description, price) in items {
        catalog::insert_item(category, name, description, price, &mut conn).await.expect("Error inserting item");
    }
    debug!("🚀️ Demo catalog seeded");
}
