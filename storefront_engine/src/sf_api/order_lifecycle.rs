//! The order state machine.
//!
//! ```text
//! pending_payment ──▶ awaiting_executor_confirmation ──▶ in_progress ──▶ completed
//!        │                        │
//!        └──────────▶ cancelled ◀─┘
//! ```
//!
//! [`OrderLifecycle`] is the only component that creates orders or changes their status. Every status write is a
//! compare-and-set on the expected prior status, so a background timer that loses a race against a user action (or
//! vice versa) turns into a no-op rather than a double transition.
use std::{fmt::Debug, sync::Arc, time::Duration};

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    clock::{add_duration, Clock},
    config::StorefrontConfig,
    db_types::{NewOrder, Order, OrderId, OrderStatusType, UserId},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    notifier::Notifier,
    sf_api::{
        cart_store::CartStore,
        errors::LifecycleError,
        executor_matcher::ExecutorMatcher,
        order_timers::{OrderTimers, TimerKind},
    },
    traits::{AssignOutcome, StoreError, StorefrontDatabase},
};

/// What happened after a client said they paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentConfirmation {
    /// An executor was assigned and asked to verify the payment.
    ExecutorAssigned(Order),
    /// Every executor is busy. Matching is retried once after the retry delay.
    AwaitingExecutor(Order),
}

impl PaymentConfirmation {
    pub fn order(&self) -> &Order {
        match self {
            PaymentConfirmation::ExecutorAssigned(o) | PaymentConfirmation::AwaitingExecutor(o) => o,
        }
    }
}

#[derive(Clone)]
pub struct OrderLifecycle<B> {
    db: B,
    carts: CartStore<B>,
    matcher: ExecutorMatcher<B>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    timers: OrderTimers,
    producers: EventProducers,
    payment_timeout: Duration,
    executor_retry_delay: Duration,
}

impl<B> Debug for OrderLifecycle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLifecycle")
    }
}

impl<B> OrderLifecycle<B>
where B: StorefrontDatabase
{
    pub fn new(
        db: B,
        carts: CartStore<B>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        producers: EventProducers,
        config: &StorefrontConfig,
    ) -> Self {
        Self {
            matcher: ExecutorMatcher::new(db.clone()),
            db,
            carts,
            notifier,
            clock,
            timers: OrderTimers::new(),
            producers,
            payment_timeout: config.payment_timeout,
            executor_retry_delay: config.executor_retry_delay,
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn timers(&self) -> &OrderTimers {
        &self.timers
    }

    pub async fn order(&self, order_id: OrderId) -> Result<Order, LifecycleError> {
        self.db.fetch_order(order_id).await?.ok_or(LifecycleError::OrderNotFound(order_id))
    }

    /// Turns the client's cart into an order in `pending_payment` status.
    ///
    /// The total is priced from the durable store. The cart is cleared and the payment watchdog armed.
    pub async fn create(&self, client: UserId) -> Result<Order, LifecycleError> {
        if self.db.fetch_user(client).await?.is_none() {
            return Err(LifecycleError::UserNotFound(client));
        }
        if self.db.has_active_order(client).await? {
            return Err(LifecycleError::ActiveOrderExists(client));
        }
        let total = self.carts.authoritative_total(client).await?;
        if !total.is_positive() {
            return Err(LifecycleError::EmptyCart);
        }
        let now = self.clock.now();
        let deadline = add_duration(now, self.payment_timeout);
        let order = self.db.insert_order(NewOrder::new(client, total, now, deadline)).await?;
        info!("🔄️📦️ Order #{} created for client {client}. Total {total}, pay by {deadline}", order.id);
        if let Err(e) = self.carts.clear(client).await {
            warn!("🔄️📦️ Could not clear the cart of client {client} after creating order #{}. {e}", order.id);
        }
        self.arm_watchdog(&order).await;
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// The client says they have paid. Sets the payment flag, then tries to find an executor.
    ///
    /// Only the owning client may confirm, and only once. If no executor is free, or matching fails once the flag is
    /// stored, matching is retried once after the retry delay.
    pub async fn confirm_payment(
        &self,
        client: UserId,
        order_id: OrderId,
    ) -> Result<PaymentConfirmation, LifecycleError> {
        let order = self.order(order_id).await?;
        if order.client_id != client {
            return Err(LifecycleError::NotOrderOwner(order_id));
        }
        let order = self.db.set_payment_confirmed(order_id).await?;
        info!("🔄️💰️ Client {client} confirmed payment for order #{order_id}");
        match self.matcher.assign(order_id).await {
            Ok(AssignOutcome::Assigned(assigned)) => {
                self.on_assigned(&assigned, false).await;
                Ok(PaymentConfirmation::ExecutorAssigned(assigned))
            },
            Ok(AssignOutcome::AlreadyAssigned(assigned)) => Ok(PaymentConfirmation::ExecutorAssigned(assigned)),
            Ok(AssignOutcome::NoExecutor) => {
                self.arm_executor_retry(order_id).await;
                Ok(PaymentConfirmation::AwaitingExecutor(order))
            },
            Err(e) => {
                // The payment flag is already stored, so the order must not be left without a retry
                warn!("🔄️💰️ Executor matching for order #{order_id} failed. Retrying later. {e}");
                self.arm_executor_retry(order_id).await;
                Ok(PaymentConfirmation::AwaitingExecutor(order))
            },
        }
    }

    /// The assigned executor has verified the payment and starts working on the order.
    pub async fn executor_confirm_payment(&self, executor: UserId, order_id: OrderId) -> Result<Order, LifecycleError> {
        let order = self.assigned_order(executor, order_id).await?;
        let order = self
            .transition(&order, OrderStatusType::AwaitingExecutorConfirmation, OrderStatusType::InProgress)
            .await?;
        self.notify_user(
            order.client_id,
            format!("Payment for order #{order_id} has been confirmed. The executor has started working on it."),
        )
        .await;
        Ok(order)
    }

    /// The assigned executor could not find the payment. The order is cancelled.
    pub async fn executor_decline_payment(&self, executor: UserId, order_id: OrderId) -> Result<Order, LifecycleError> {
        let order = self.assigned_order(executor, order_id).await?;
        let order =
            self.transition(&order, OrderStatusType::AwaitingExecutorConfirmation, OrderStatusType::Cancelled).await?;
        self.notify_user(
            order.client_id,
            format!("Payment for order #{order_id} was declined. Please contact support."),
        )
        .await;
        Ok(order)
    }

    /// The assigned executor has fulfilled the order.
    pub async fn complete(&self, executor: UserId, order_id: OrderId) -> Result<Order, LifecycleError> {
        let order = self.assigned_order(executor, order_id).await?;
        let order = self.transition(&order, OrderStatusType::InProgress, OrderStatusType::Completed).await?;
        self.notify_user(order.client_id, format!("Order #{order_id} is complete! You can now place a new order."))
            .await;
        Ok(order)
    }

    /// Re-arms timers for orders that were pending when the process last stopped.
    ///
    /// Unconfirmed orders get their payment watchdog back. Confirmed orders without an executor get the executor
    /// retry. Returns the number of timers armed.
    pub async fn resume_timers(&self) -> Result<usize, LifecycleError> {
        let pending = self.db.fetch_orders_by_status(OrderStatusType::PendingPayment).await?;
        let mut armed = 0;
        for order in pending {
            if order.awaits_payment() {
                armed += usize::from(self.arm_watchdog(&order).await);
            } else if order.awaits_executor() {
                armed += usize::from(self.arm_executor_retry(order.id).await);
            }
        }
        info!("🕰️ {armed} order timers resumed");
        Ok(armed)
    }

    /// Stops every outstanding timer.
    pub async fn shutdown(&self) {
        self.timers.shutdown().await;
    }

    async fn assigned_order(&self, executor: UserId, order_id: OrderId) -> Result<Order, LifecycleError> {
        let order = self.order(order_id).await?;
        if order.executor_id != Some(executor) {
            return Err(LifecycleError::WrongExecutor(order_id));
        }
        Ok(order)
    }

    async fn transition(
        &self,
        order: &Order,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, LifecycleError> {
        if order.status != from {
            return Err(LifecycleError::IllegalTransition { order: order.id, from: order.status, to });
        }
        let updated = self.db.update_status(order.id, from, to).await?;
        self.producers.publish_status_changed(OrderStatusChangedEvent::new(updated.clone(), from)).await;
        Ok(updated)
    }

    /// Notifications after a successful assignment. The client is only told on the retry path, since on the
    /// immediate path the confirmation result already reaches them.
    async fn on_assigned(&self, order: &Order, notify_client: bool) {
        self.producers
            .publish_status_changed(OrderStatusChangedEvent::new(order.clone(), OrderStatusType::PendingPayment))
            .await;
        if let Some(executor) = order.executor_id {
            self.notify_user(
                executor,
                format!(
                    "New order #{} for {}. Please verify the client's payment and confirm or decline it.",
                    order.id, order.total_amount
                ),
            )
            .await;
        }
        if notify_client {
            self.notify_user(
                order.client_id,
                format!("An executor has been found for order #{}. They are verifying your payment.", order.id),
            )
            .await;
        }
    }

    async fn arm_watchdog(&self, order: &Order) -> bool {
        let this = self.clone();
        let order_id = order.id;
        let deadline = order.payment_deadline;
        let task = async move {
            this.clock.sleep_until(deadline).await;
            this.run_watchdog(order_id).await;
        };
        self.timers.arm(order_id, TimerKind::PaymentWatchdog, task).await
    }

    async fn arm_executor_retry(&self, order_id: OrderId) -> bool {
        let this = self.clone();
        let deadline = add_duration(self.clock.now(), self.executor_retry_delay);
        debug!("🕰️ Retrying executor matching for order #{order_id} at {deadline}");
        let task = async move {
            this.clock.sleep_until(deadline).await;
            this.run_executor_retry(order_id).await;
        };
        self.timers.arm(order_id, TimerKind::ExecutorRetry, task).await
    }

    /// Cancels the order if it is still unpaid once the deadline has passed.
    async fn run_watchdog(&self, order_id: OrderId) {
        trace!("🕰️ Payment watchdog fired for order #{order_id}");
        let order = match self.db.fetch_order(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("🕰️ Payment watchdog: order #{order_id} has disappeared");
                return;
            },
            Err(e) => {
                error!("🕰️ Payment watchdog could not read order #{order_id}. {e}");
                return;
            },
        };
        if !order.awaits_payment() {
            debug!("🕰️ Order #{order_id} no longer awaits payment ({}). Watchdog stands down.", order.status);
            return;
        }
        match self.cancel_pending(&order).await {
            Ok(true) => {
                info!("🕰️ Order #{order_id} cancelled: payment deadline passed");
                self.notify_user(
                    order.client_id,
                    format!("Order #{order_id} was cancelled because payment was not confirmed in time."),
                )
                .await;
            },
            Ok(false) => debug!("🕰️ Order #{order_id} changed before the watchdog could cancel it"),
            Err(e) => error!("🕰️ Payment watchdog could not cancel order #{order_id}. {e}"),
        }
    }

    /// The single retry of executor matching. If nobody is free this time either, the order is cancelled.
    async fn run_executor_retry(&self, order_id: OrderId) {
        trace!("🕰️ Executor retry fired for order #{order_id}");
        let order = match self.db.fetch_order(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!("🕰️ Executor retry: order #{order_id} has disappeared");
                return;
            },
            Err(e) => {
                error!("🕰️ Executor retry could not read order #{order_id}. {e}");
                return;
            },
        };
        if !order.awaits_executor() {
            debug!("🕰️ Order #{order_id} no longer needs an executor ({}). Retry stands down.", order.status);
            return;
        }
        match self.matcher.assign(order_id).await {
            Ok(AssignOutcome::Assigned(assigned)) => self.on_assigned(&assigned, true).await,
            Ok(AssignOutcome::AlreadyAssigned(_)) => debug!("🕰️ Order #{order_id} was assigned in the meantime"),
            Ok(AssignOutcome::NoExecutor) => self.cancel_unmatched(&order).await,
            Err(e) => {
                error!("🕰️ Executor retry for order #{order_id} failed. Giving up on the order. {e}");
                self.cancel_unmatched(&order).await;
            },
        }
    }

    /// Cancels a paid order that never found an executor and tells the client.
    async fn cancel_unmatched(&self, order: &Order) {
        let order_id = order.id;
        match self.cancel_pending(order).await {
            Ok(true) => {
                info!("🕰️ Order #{order_id} cancelled: no executor available");
                self.notify_user(
                    order.client_id,
                    format!(
                        "Sorry, no executor is available for order #{order_id}. The order has been cancelled. \
                         Please contact support about your payment."
                    ),
                )
                .await;
            },
            Ok(false) => debug!("🕰️ Order #{order_id} changed before the retry could cancel it"),
            Err(e) => error!("🕰️ Executor retry could not cancel order #{order_id}. {e}"),
        }
    }

    /// `pending_payment -> cancelled`. Returns `false` if the order had already moved on.
    async fn cancel_pending(&self, order: &Order) -> Result<bool, StoreError> {
        match self.db.update_status(order.id, OrderStatusType::PendingPayment, OrderStatusType::Cancelled).await {
            Ok(updated) => {
                self.producers
                    .publish_status_changed(OrderStatusChangedEvent::new(updated, OrderStatusType::PendingPayment))
                    .await;
                Ok(true)
            },
            Err(StoreError::IllegalTransition { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Looks up the chat identity of the user and sends the message. Failures are logged and swallowed.
    async fn notify_user(&self, user: UserId, text: String) {
        let recipient = match self.db.fetch_user(user).await {
            Ok(Some(u)) => u.external_id,
            Ok(None) => {
                warn!("📨️ Cannot notify user {user}: no such user");
                return;
            },
            Err(e) => {
                warn!("📨️ Cannot notify user {user}. {e}");
                return;
            },
        };
        if let Err(e) = self.notifier.notify(recipient, text).await {
            warn!("📨️ Notification to {recipient} failed. {e}");
        }
    }
}
