use std::future::Future;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, UserId},
    traits::{AssignOutcome, StoreError},
};

/// Durable order records and their status transitions.
///
/// Orders are never deleted, and the total amount never changes after the insert.
pub trait OrderManagement {
    /// Stores a new order in `pending_payment` status.
    ///
    /// Fails with [`StoreError::UserNotFound`] if the client does not exist.
    fn insert_order(&self, order: NewOrder) -> impl Future<Output = Result<Order, StoreError>> + Send;

    fn fetch_order(&self, id: OrderId) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// Moves the order from `expected` to `new_status`.
    ///
    /// The write only happens if the order is still in `expected` status at the moment of the write. If it is not,
    /// nothing changes and [`StoreError::IllegalTransition`] reports the status that was actually found. Transitions
    /// that the state machine does not allow are rejected without touching the store.
    fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatusType,
        new_status: OrderStatusType,
    ) -> impl Future<Output = Result<Order, StoreError>> + Send;

    /// Sets the "client claims paid" flag.
    ///
    /// The flag only moves from false to true, and only while the order is `pending_payment`. A second confirmation
    /// fails with [`StoreError::PaymentAlreadyConfirmed`].
    fn set_payment_confirmed(&self, id: OrderId) -> impl Future<Output = Result<Order, StoreError>> + Send;

    /// Whether the client has an order in a non-terminal status.
    fn has_active_order(&self, client: UserId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// The client's non-terminal order, if any.
    fn fetch_active_order(&self, client: UserId) -> impl Future<Output = Result<Option<Order>, StoreError>> + Send;

    /// All orders in the given status, oldest first.
    fn fetch_orders_by_status(
        &self,
        status: OrderStatusType,
    ) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;

    /// Atomically picks the first executor (by id) with no order `in_progress`, stores it on the order and moves the
    /// order to `awaiting_executor_confirmation`.
    ///
    /// The order must be `pending_payment` with the payment flag set. An order that already has an executor is
    /// reported as [`AssignOutcome::AlreadyAssigned`] and is never reassigned.
    fn assign_free_executor(&self, id: OrderId) -> impl Future<Output = Result<AssignOutcome, StoreError>> + Send;
}
