use std::future::Future;

use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, UserId},
    traits::{CatalogManagement, OrderManagement, UserManagement},
};

/// The highest level of behaviour for durable stores backing the storefront engine.
pub trait StorefrontDatabase:
    Clone + Send + Sync + 'static + CatalogManagement + UserManagement + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = Result<(), StoreError>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested user {0} does not exist")]
    UserNotFound(UserId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order} cannot move from {from} to {to}")]
    IllegalTransition { order: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Payment for order {0} has already been confirmed")]
    PaymentAlreadyConfirmed(OrderId),
    #[error("Order {0} is not awaiting payment. Its status is {1}")]
    OrderNotPending(OrderId, OrderStatusType),
    #[error("The client has not confirmed payment for order {0} yet")]
    PaymentNotConfirmed(OrderId),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
