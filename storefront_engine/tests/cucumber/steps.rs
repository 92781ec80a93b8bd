use std::time::Duration;

use cucumber::{given, then, when};
use storefront_engine::{
    db_types::{ExternalId, GameId, ItemId, OrderStatusType},
    ApiError,
    Amount,
    ExecutorMatcher,
    TimerKind,
};

use crate::{
    cucumber::StorefrontWorld,
    support::{TestSystem, TIMER_WAIT},
};

#[given("a storefront with the demo catalog")]
async fn new_storefront(world: &mut StorefrontWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given(expr = "executor {int} is registered")]
async fn executor_is_registered(world: &mut StorefrontWorld, executor: i64) {
    world.sys().executor(executor).await;
}

#[when(expr = "executor {int} registers")]
async fn executor_registers(world: &mut StorefrontWorld, executor: i64) {
    world.sys().executor(executor).await;
}

#[given(expr = "client {int} has started a session")]
async fn client_started_session(world: &mut StorefrontWorld, client: i64) {
    world.sys().client(client).await;
}

#[given(expr = "client {int} has {int} of item {int} in the cart")]
async fn client_has_items(world: &mut StorefrontWorld, client: i64, quantity: u32, item: i64) {
    let user = world.sys().client(client).await;
    world.sys().api.carts().add(user, ItemId::from(item), quantity).await.expect("Error filling the cart");
}

#[when(expr = "client {int} adds {int} of item {int} to the cart")]
async fn client_adds_items(world: &mut StorefrontWorld, client: i64, quantity: u32, item: i64) {
    let user = world.user_id(client).await;
    for _ in 0..quantity {
        world.sys().api.add_item(user, ItemId::from(item)).await.expect("Error adding to the cart");
    }
}

#[when(expr = "client {int} browses the categories of game {int}")]
async fn client_browses_game(world: &mut StorefrontWorld, client: i64, game: i64) {
    let user = world.user_id(client).await;
    world.sys().api.browse_categories(user, GameId::from(game)).await.expect("Error browsing categories");
}

#[when(expr = "client {int} returns to the menu")]
async fn client_returns_to_menu(world: &mut StorefrontWorld, client: i64) {
    let user = world.user_id(client).await;
    world.sys().api.return_to_menu(user).await.expect("Error returning to the menu");
}

#[when(expr = "client {int} places an order")]
async fn client_places_order(world: &mut StorefrontWorld, client: i64) {
    let user = world.user_id(client).await;
    let order = world.sys().lifecycle.create(user).await.expect("Error placing order");
    world.orders.insert(client, order.id);
}

#[when(expr = "client {int} confirms payment")]
async fn client_confirms_payment(world: &mut StorefrontWorld, client: i64) {
    let user = world.user_id(client).await;
    let order = world.order_id(client);
    world.sys().lifecycle.confirm_payment(user, order).await.expect("Error confirming payment");
}

#[when(expr = "executor {int} confirms payment for the order of client {int}")]
async fn executor_confirms_payment(world: &mut StorefrontWorld, executor: i64, client: i64) {
    let user = world.user_id(executor).await;
    let order = world.order_id(client);
    world.sys().lifecycle.executor_confirm_payment(user, order).await.expect("Error confirming payment");
}

#[when(expr = "executor {int} declines payment for the order of client {int}")]
async fn executor_declines_payment(world: &mut StorefrontWorld, executor: i64, client: i64) {
    let user = world.user_id(executor).await;
    let order = world.order_id(client);
    world.sys().lifecycle.executor_decline_payment(user, order).await.expect("Error declining payment");
}

#[when(expr = "executor {int} completes the order of client {int}")]
async fn executor_completes_order(world: &mut StorefrontWorld, executor: i64, client: i64) {
    let user = world.user_id(executor).await;
    let order = world.order_id(client);
    world.sys().lifecycle.complete(user, order).await.expect("Error completing order");
}

#[when(expr = "the executor is matched again for the order of client {int}")]
async fn match_again(world: &mut StorefrontWorld, client: i64) {
    let matcher = ExecutorMatcher::new(world.sys().db.clone());
    matcher.assign(world.order_id(client)).await.expect("Error matching executor");
}

#[when(expr = "{int} seconds pass")]
async fn time_passes(world: &mut StorefrontWorld, seconds: u64) {
    world.sys().clock.advance(Duration::from_secs(seconds));
}

#[when(expr = "the payment watchdog for the order of client {int} has run")]
async fn watchdog_has_run(world: &mut StorefrontWorld, client: i64) {
    wait_for_timer(world, client, TimerKind::PaymentWatchdog).await;
}

#[when(expr = "the executor retry for the order of client {int} has run")]
async fn retry_has_run(world: &mut StorefrontWorld, client: i64) {
    wait_for_timer(world, client, TimerKind::ExecutorRetry).await;
}

async fn wait_for_timer(world: &StorefrontWorld, client: i64, kind: TimerKind) {
    let order = world.order_id(client);
    let fired = tokio::time::timeout(TIMER_WAIT, world.sys().lifecycle.timers().wait_for(order, kind))
        .await
        .unwrap_or_else(|_| panic!("The {kind} for order #{order} did not fire"));
    assert!(fired, "The {kind} for order #{order} was not armed");
}

#[then(expr = "the order of client {int} totals {int}")]
async fn order_totals(world: &mut StorefrontWorld, client: i64, total: i64) {
    assert_eq!(world.order_of(client).await.total_amount, Amount::from(total));
}

#[then(expr = "the order of client {int} is {word}")]
async fn order_has_status(world: &mut StorefrontWorld, client: i64, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(world.order_of(client).await.status, status);
}

#[then(expr = "the order of client {int} is assigned to executor {int}")]
async fn order_is_assigned(world: &mut StorefrontWorld, client: i64, executor: i64) {
    let executor = world.user_id(executor).await;
    assert_eq!(world.order_of(client).await.executor_id, Some(executor));
}

#[then(expr = "the order of client {int} has no executor")]
async fn order_has_no_executor(world: &mut StorefrontWorld, client: i64) {
    assert_eq!(world.order_of(client).await.executor_id, None);
}

#[then(expr = "{word} {int} has received {int} notification(s)")]
async fn notifications_received(world: &mut StorefrontWorld, _role: String, user: i64, count: usize) {
    let messages = world.sys().notifier.messages_for(ExternalId::from(user));
    assert_eq!(messages.len(), count, "Messages to {user}: {messages:?}");
}

#[then(expr = "client {int} has {int} of item {int} in the cart")]
async fn cart_quantity(world: &mut StorefrontWorld, client: i64, quantity: u32, item: i64) {
    let user = world.user_id(client).await;
    assert_eq!(world.sys().api.carts().quantity(user, ItemId::from(item)).await, quantity);
}

#[then(expr = "the cart total of client {int} is {int}")]
async fn cart_total(world: &mut StorefrontWorld, client: i64, total: i64) {
    let user = world.user_id(client).await;
    assert_eq!(world.sys().api.carts().total_amount(user).await, Amount::from(total));
}

#[then(expr = "client {int} is asked to finish the existing order when browsing games")]
async fn browsing_is_refused(world: &mut StorefrontWorld, client: i64) {
    let user = world.user_id(client).await;
    let err = world.sys().api.browse_games(user).await.expect_err("Browsing should be refused");
    assert!(matches!(err, ApiError::ActiveOrderExists(_)), "Unexpected error: {err}");
}
