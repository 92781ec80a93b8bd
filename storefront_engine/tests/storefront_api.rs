//! The browsing flow, from `/start` to a filled cart.
mod support;

use storefront_engine::{
    db_types::{CategoryId, ExternalId, GameId, ItemId, Role},
    ApiError,
    Amount,
};
use support::TestSystem;

#[tokio::test]
async fn sessions_register_users_once() {
    let _ = env_logger::try_init();
    let sys = TestSystem::new().await;
    let first = sys.api.start_session(ExternalId::from(555)).await.unwrap();
    assert!(first.is_new);
    assert!(!first.has_active_order);
    assert_eq!(first.user.role, Role::Client);

    sys.api.add_item(first.user.id, ItemId::from(1)).await.unwrap();
    let again = sys.api.start_session(ExternalId::from(555)).await.unwrap();
    assert!(!again.is_new);
    assert_eq!(again.user.id, first.user.id);
    // A returning client starts with an empty cart
    assert!(sys.api.cart_lines(first.user.id).await.unwrap().is_empty());

    let err = sys.api.user(ExternalId::from(556)).await.unwrap_err();
    assert!(matches!(err, ApiError::UserNotRegistered(_)));
    assert_eq!(err.user_message(), "Please send /start first.");
    sys.tear_down().await;
}

#[tokio::test]
async fn clients_are_not_promoted_to_executors() {
    let sys = TestSystem::new().await;
    sys.client(600).await;
    let (user, is_new) = sys.api.register_executor(ExternalId::from(600)).await.unwrap();
    assert!(!is_new);
    assert_eq!(user.role, Role::Client);
    let (user, is_new) = sys.api.register_executor(ExternalId::from(601)).await.unwrap();
    assert!(is_new);
    assert!(user.is_executor());
    sys.tear_down().await;
}

#[tokio::test]
async fn browsing_the_catalog() {
    let sys = TestSystem::new().await;
    let client = sys.client(700).await;
    let games = sys.api.browse_games(client).await.unwrap();
    let names = games.iter().map(|g| g.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Genshin Impact", "Honkai: Star Rail"]);

    let categories = sys.api.browse_categories(client, GameId::from(1)).await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].name, "Genesis Crystals");
    let err = sys.api.browse_categories(client, GameId::from(99)).await.unwrap_err();
    assert!(matches!(err, ApiError::GameNotFound(_)));

    let items = sys.api.browse_items(client, CategoryId::from(1)).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "60 Genesis Crystals");
    assert_eq!(items[1].price, Amount::from(250));
    assert_eq!(items[1].description.as_deref(), Some("Best value"));
    let err = sys.api.browse_items(client, CategoryId::from(42)).await.unwrap_err();
    assert!(matches!(err, ApiError::CategoryNotFound(_)));
    sys.tear_down().await;
}

#[tokio::test]
async fn adding_items_keeps_a_running_total() {
    let sys = TestSystem::new().await;
    let client = sys.client(800).await;
    let update = sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    assert_eq!(update.quantity, 1);
    assert_eq!(update.total, Amount::from(100));
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    let update = sys.api.add_item(client, ItemId::from(3)).await.unwrap();
    assert_eq!(update.quantity, 1);
    assert_eq!(update.total, Amount::from(600));

    let lines = sys.api.cart_lines(client).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item_name, "60 Genesis Crystals");
    assert_eq!(lines[0].category_name, "Genesis Crystals");
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].line_total, Amount::from(200));
    assert_eq!(lines[1].category_name, "Welkin Moon");
    assert_eq!(lines[1].line_total, Amount::from(400));

    let err = sys.api.add_item(client, ItemId::from(999)).await.unwrap_err();
    assert!(matches!(err, ApiError::ItemNotFound(_)));
    let err = sys.api.add_item(client, ItemId::from(0)).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    sys.tear_down().await;
}

#[tokio::test]
async fn quantities_stop_at_ten() {
    let sys = TestSystem::new().await;
    let client = sys.client(801).await;
    for _ in 0..12 {
        sys.api.add_item(client, ItemId::from(4)).await.unwrap();
    }
    let lines = sys.api.cart_lines(client).await.unwrap();
    assert_eq!(lines[0].quantity, 10);
    assert_eq!(lines[0].line_total, Amount::from(900));
    sys.tear_down().await;
}

#[tokio::test]
async fn switching_games_empties_the_cart() {
    let sys = TestSystem::new().await;
    let client = sys.client(900).await;
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    sys.api.add_item(client, ItemId::from(3)).await.unwrap();
    // Same game, different category: the cart survives
    sys.api.browse_items(client, CategoryId::from(2)).await.unwrap();
    assert_eq!(sys.api.cart_lines(client).await.unwrap().len(), 2);

    let update = sys.api.add_item(client, ItemId::from(5)).await.unwrap();
    assert_eq!(update.total, Amount::from(380));
    let lines = sys.api.cart_lines(client).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item_id, ItemId::from(5));

    sys.api.browse_categories(client, GameId::from(1)).await.unwrap();
    assert!(sys.api.cart_lines(client).await.unwrap().is_empty());
    sys.tear_down().await;
}

#[tokio::test]
async fn returning_to_the_menu_discards_the_cart() {
    let sys = TestSystem::new().await;
    let client = sys.client(901).await;
    sys.api.add_item(client, ItemId::from(2)).await.unwrap();
    sys.api.return_to_menu(client).await.unwrap();
    assert!(sys.api.cart_lines(client).await.unwrap().is_empty());
    sys.tear_down().await;
}

#[tokio::test]
async fn an_active_order_blocks_browsing() {
    let sys = TestSystem::new().await;
    let client = sys.client(1000).await;
    let executor = sys.executor(9000).await;
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();

    let session = sys.api.start_session(ExternalId::from(1000)).await.unwrap();
    assert!(session.has_active_order);
    assert!(matches!(sys.api.browse_games(client).await, Err(ApiError::ActiveOrderExists(_))));
    assert!(matches!(
        sys.api.browse_categories(client, GameId::from(1)).await,
        Err(ApiError::ActiveOrderExists(_))
    ));
    assert!(matches!(sys.api.browse_items(client, CategoryId::from(1)).await, Err(ApiError::ActiveOrderExists(_))));
    let err = sys.api.add_item(client, ItemId::from(1)).await.unwrap_err();
    assert_eq!(err.user_message(), "You have an active order. Please finish it before starting a new one.");

    sys.lifecycle.confirm_payment(client, order.id).await.unwrap();
    assert_eq!(sys.api.executor_external_id(order.id).await.unwrap(), Some(ExternalId::from(9000)));
    sys.lifecycle.executor_confirm_payment(executor, order.id).await.unwrap();
    sys.lifecycle.complete(executor, order.id).await.unwrap();
    assert_eq!(sys.api.browse_games(client).await.unwrap().len(), 2);
    sys.tear_down().await;
}
