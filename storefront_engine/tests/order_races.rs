//! Timer and concurrency behaviour of the order lifecycle, run against a real SQLite database.
mod support;

use std::time::Duration;

use storefront_engine::{
    db_types::{ExternalId, ItemId, OrderStatusType},
    AssignOutcome,
    ExecutorMatcher,
    LifecycleError,
    OrderManagement,
    PaymentConfirmation,
    TimerKind,
};
use support::{TestSystem, TIMER_WAIT};

async fn wait_for_timer(sys: &TestSystem, order: storefront_engine::db_types::OrderId, kind: TimerKind) {
    let fired = tokio::time::timeout(TIMER_WAIT, sys.lifecycle.timers().wait_for(order, kind)).await;
    assert!(fired.expect("Timer did not fire in time"), "The {kind} for order #{order} was not armed");
}

#[tokio::test]
async fn concurrent_payment_confirmations_assign_once() {
    let _ = env_logger::try_init();
    let sys = TestSystem::new().await;
    let client = sys.client(1001).await;
    let executor = sys.executor(9001).await;
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();

    let (a, b) = tokio::join!(
        sys.lifecycle.confirm_payment(client, order.id),
        sys.lifecycle.confirm_payment(client, order.id)
    );
    let (ok, err) = match (a, b) {
        (Ok(ok), Err(err)) | (Err(err), Ok(ok)) => (ok, err),
        other => panic!("Expected exactly one confirmation to succeed, got {other:?}"),
    };
    assert!(matches!(ok, PaymentConfirmation::ExecutorAssigned(_)));
    assert!(matches!(err, LifecycleError::PaymentAlreadyConfirmed(_)));

    let stored = sys.lifecycle.order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::AwaitingExecutorConfirmation);
    assert_eq!(stored.executor_id, Some(executor));
    assert_eq!(sys.notifier.messages_for(ExternalId::from(9001)).len(), 1);
    sys.tear_down().await;
}

#[tokio::test]
async fn confirming_just_before_the_deadline_disarms_the_watchdog() {
    let sys = TestSystem::new().await;
    let client = sys.client(1002).await;
    sys.executor(9002).await;
    sys.api.add_item(client, ItemId::from(2)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();
    sys.clock.advance(Duration::from_secs(599));
    sys.lifecycle.confirm_payment(client, order.id).await.unwrap();
    sys.clock.advance(Duration::from_secs(1));
    wait_for_timer(&sys, order.id, TimerKind::PaymentWatchdog).await;
    let stored = sys.lifecycle.order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::AwaitingExecutorConfirmation);
    assert!(sys.notifier.messages_for(ExternalId::from(1002)).is_empty());
    sys.tear_down().await;
}

#[tokio::test]
async fn retry_without_executor_cancels_and_notifies_once() {
    let sys = TestSystem::new().await;
    let client = sys.client(1003).await;
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();
    let confirmation = sys.lifecycle.confirm_payment(client, order.id).await.unwrap();
    let PaymentConfirmation::AwaitingExecutor(pending) = confirmation else {
        panic!("No executor is registered, so none can be assigned");
    };
    assert_eq!(pending.status, OrderStatusType::PendingPayment);
    assert!(pending.payment_confirmed_by_user);
    // Executors may not be matched while the retry is outstanding
    assert!(sys.lifecycle.timers().is_armed(order.id, TimerKind::ExecutorRetry).await);

    sys.clock.advance(Duration::from_secs(300));
    wait_for_timer(&sys, order.id, TimerKind::ExecutorRetry).await;
    assert_eq!(sys.lifecycle.order(order.id).await.unwrap().status, OrderStatusType::Cancelled);

    // The payment deadline passing afterwards changes nothing
    sys.clock.advance(Duration::from_secs(300));
    wait_for_timer(&sys, order.id, TimerKind::PaymentWatchdog).await;
    let messages = sys.notifier.messages_for(ExternalId::from(1003));
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("no executor is available"));
    sys.tear_down().await;
}

#[tokio::test]
async fn retry_finds_an_executor_that_became_free() {
    let sys = TestSystem::new().await;
    let client = sys.client(1004).await;
    sys.api.add_item(client, ItemId::from(3)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();
    sys.lifecycle.confirm_payment(client, order.id).await.unwrap();
    let executor = sys.executor(9004).await;

    sys.clock.advance(Duration::from_secs(300));
    wait_for_timer(&sys, order.id, TimerKind::ExecutorRetry).await;
    let stored = sys.lifecycle.order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::AwaitingExecutorConfirmation);
    assert_eq!(stored.executor_id, Some(executor));
    assert_eq!(sys.notifier.messages_for(ExternalId::from(1004)).len(), 1);
    assert_eq!(sys.notifier.messages_for(ExternalId::from(9004)).len(), 1);
    sys.tear_down().await;
}

#[tokio::test]
async fn busy_executors_are_skipped() {
    let sys = TestSystem::new().await;
    let executor = sys.executor(9005).await;
    let first = sys.client(1005).await;
    let second = sys.client(1006).await;

    sys.api.add_item(first, ItemId::from(1)).await.unwrap();
    let order = sys.lifecycle.create(first).await.unwrap();
    sys.lifecycle.confirm_payment(first, order.id).await.unwrap();
    sys.lifecycle.executor_confirm_payment(executor, order.id).await.unwrap();

    sys.api.add_item(second, ItemId::from(1)).await.unwrap();
    let other = sys.lifecycle.create(second).await.unwrap();
    let confirmation = sys.lifecycle.confirm_payment(second, other.id).await.unwrap();
    assert!(matches!(confirmation, PaymentConfirmation::AwaitingExecutor(_)));

    // The executor finishes before the retry fires and picks up the waiting order
    sys.lifecycle.complete(executor, order.id).await.unwrap();
    sys.clock.advance(Duration::from_secs(300));
    wait_for_timer(&sys, other.id, TimerKind::ExecutorRetry).await;
    assert_eq!(sys.lifecycle.order(other.id).await.unwrap().executor_id, Some(executor));
    sys.tear_down().await;
}

#[tokio::test]
async fn an_assigned_order_is_never_reassigned() {
    let sys = TestSystem::new().await;
    let client = sys.client(1007).await;
    let executor = sys.executor(9007).await;
    for _ in 0..5 {
        sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    }
    let order = sys.lifecycle.create(client).await.unwrap();
    assert_eq!(order.total_amount.value(), 500);
    sys.lifecycle.confirm_payment(client, order.id).await.unwrap();

    sys.executor(9008).await;
    let matcher = ExecutorMatcher::new(sys.db.clone());
    let outcome = matcher.assign(order.id).await.unwrap();
    let AssignOutcome::AlreadyAssigned(stored) = outcome else {
        panic!("The order already has an executor");
    };
    assert_eq!(stored.executor_id, Some(executor));
    assert!(sys.notifier.messages_for(ExternalId::from(9008)).is_empty());
    sys.tear_down().await;
}

#[tokio::test]
async fn timers_resume_after_a_restart() {
    let sys = TestSystem::new().await;
    let unpaid_client = sys.client(1008).await;
    let waiting_client = sys.client(1009).await;
    sys.api.add_item(unpaid_client, ItemId::from(1)).await.unwrap();
    sys.api.add_item(waiting_client, ItemId::from(2)).await.unwrap();
    let unpaid = sys.lifecycle.create(unpaid_client).await.unwrap();
    let waiting = sys.lifecycle.create(waiting_client).await.unwrap();
    sys.lifecycle.confirm_payment(waiting_client, waiting.id).await.unwrap();
    // The process goes down with both timers outstanding
    sys.lifecycle.shutdown().await;

    let restarted = sys.restart().await;
    assert_eq!(restarted.lifecycle.resume_timers().await.unwrap(), 2);
    assert_eq!(restarted.lifecycle.resume_timers().await.unwrap(), 0);
    assert!(restarted.lifecycle.timers().is_armed(unpaid.id, TimerKind::PaymentWatchdog).await);
    assert!(restarted.lifecycle.timers().is_armed(waiting.id, TimerKind::ExecutorRetry).await);

    restarted.clock.advance(Duration::from_secs(600));
    wait_for_timer(&restarted, unpaid.id, TimerKind::PaymentWatchdog).await;
    wait_for_timer(&restarted, waiting.id, TimerKind::ExecutorRetry).await;
    let fetched = restarted.db.fetch_orders_by_status(OrderStatusType::Cancelled).await.unwrap();
    assert_eq!(fetched.len(), 2);
    sys.lifecycle.shutdown().await;
    restarted.tear_down().await;
}

const BLOCK_ASSIGNMENT: &str = "CREATE TRIGGER block_assignment BEFORE UPDATE OF executor_id ON orders \
                                BEGIN SELECT RAISE(ABORT, 'assignment unavailable'); END";

#[tokio::test]
async fn failed_matching_after_payment_still_arms_the_retry() {
    let sys = TestSystem::new().await;
    let client = sys.client(1010).await;
    let executor = sys.executor(9010).await;
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();
    sqlx::query(BLOCK_ASSIGNMENT).execute(sys.db.pool()).await.unwrap();

    let confirmation = sys.lifecycle.confirm_payment(client, order.id).await.unwrap();
    let PaymentConfirmation::AwaitingExecutor(pending) = confirmation else {
        panic!("The assignment write fails, so no executor can be assigned");
    };
    assert!(pending.payment_confirmed_by_user);
    assert!(sys.lifecycle.timers().is_armed(order.id, TimerKind::ExecutorRetry).await);
    let err = sys.lifecycle.confirm_payment(client, order.id).await.unwrap_err();
    assert!(matches!(err, LifecycleError::PaymentAlreadyConfirmed(_)));
    assert!(sys.db.has_active_order(client).await.unwrap());

    sqlx::query("DROP TRIGGER block_assignment").execute(sys.db.pool()).await.unwrap();
    sys.clock.advance(Duration::from_secs(300));
    wait_for_timer(&sys, order.id, TimerKind::ExecutorRetry).await;
    let stored = sys.lifecycle.order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::AwaitingExecutorConfirmation);
    assert_eq!(stored.executor_id, Some(executor));
    assert!(sys.db.has_active_order(client).await.unwrap());
    sys.tear_down().await;
}

#[tokio::test]
async fn retry_that_cannot_match_cancels_and_notifies() {
    let sys = TestSystem::new().await;
    let client = sys.client(1011).await;
    sys.executor(9011).await;
    sys.api.add_item(client, ItemId::from(1)).await.unwrap();
    let order = sys.lifecycle.create(client).await.unwrap();
    sqlx::query(BLOCK_ASSIGNMENT).execute(sys.db.pool()).await.unwrap();
    sys.lifecycle.confirm_payment(client, order.id).await.unwrap();

    sys.clock.advance(Duration::from_secs(300));
    wait_for_timer(&sys, order.id, TimerKind::ExecutorRetry).await;
    let stored = sys.lifecycle.order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatusType::Cancelled);
    assert!(stored.executor_id.is_none());
    let messages = sys.notifier.messages_for(ExternalId::from(1011));
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("no executor is available"));
    assert!(!sys.db.has_active_order(client).await.unwrap());
    assert!(!sys.api.browse_games(client).await.unwrap().is_empty());
    sys.tear_down().await;
}
