use thiserror::Error;

use crate::{
    db_types::{CategoryId, ExternalId, GameId, ItemId, OrderId, OrderStatusType, UserId},
    sf_api::cart_store::CartError,
    traits::StoreError,
};

const MSG_TRY_LATER: &str = "Something went wrong on our side. Please try again later.";
const MSG_FINISH_ORDER: &str = "You have an active order. Please finish it before starting a new one.";

/// Errors raised by the browsing facade.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    Store(StoreError),
    #[error("Cart error: {0}")]
    Cart(CartError),
    #[error("Client {0} has an active order")]
    ActiveOrderExists(UserId),
    #[error("User with external id {0} is not registered")]
    UserNotRegistered(ExternalId),
    #[error("User {0} does not exist")]
    UserNotFound(UserId),
    #[error("Game {0} does not exist")]
    GameNotFound(GameId),
    #[error("Category {0} does not exist")]
    CategoryNotFound(CategoryId),
    #[error("Item {0} does not exist")]
    ItemNotFound(ItemId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Invalid request: {0}")]
    Validation(String),
}

impl ApiError {
    /// A plain-language message that the chat transport can show to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ActiveOrderExists(_) => MSG_FINISH_ORDER.into(),
            ApiError::UserNotRegistered(_) | ApiError::UserNotFound(_) => "Please send /start first.".into(),
            ApiError::GameNotFound(_) | ApiError::CategoryNotFound(_) | ApiError::ItemNotFound(_) => {
                "That product is no longer available.".into()
            },
            ApiError::OrderNotFound(_) => "We could not find that order.".into(),
            ApiError::Validation(_) => "That request is not valid.".into(),
            ApiError::Cart(e) => e.user_message(),
            ApiError::Store(_) => MSG_TRY_LATER.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => ApiError::UserNotFound(id),
            StoreError::OrderNotFound(id) => ApiError::OrderNotFound(id),
            e => ApiError::Store(e),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound(id) => ApiError::ItemNotFound(id),
            CartError::Store(e) => e.into(),
            e => ApiError::Cart(e),
        }
    }
}

/// Errors raised while driving an order through its lifecycle.
#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    #[error("The durable store is unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Cart error: {0}")]
    Cart(CartError),
    #[error("Cannot create an order from an empty cart")]
    EmptyCart,
    #[error("Client {0} already has an active order")]
    ActiveOrderExists(UserId),
    #[error("User {0} does not exist")]
    UserNotFound(UserId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} does not belong to this client")]
    NotOrderOwner(OrderId),
    #[error("Order {0} is not assigned to this executor")]
    WrongExecutor(OrderId),
    #[error("Payment for order {0} has already been confirmed")]
    PaymentAlreadyConfirmed(OrderId),
    #[error("Order {0} is not awaiting payment. Its status is {1}")]
    OrderNotPending(OrderId, OrderStatusType),
    #[error("The client has not confirmed payment for order {0}")]
    PaymentNotConfirmed(OrderId),
    #[error("Order {order} cannot move from {from} to {to}")]
    IllegalTransition { order: OrderId, from: OrderStatusType, to: OrderStatusType },
}

impl LifecycleError {
    /// A plain-language message that the chat transport can show to the user.
    pub fn user_message(&self) -> String {
        match self {
            LifecycleError::StoreUnavailable(_) => MSG_TRY_LATER.into(),
            LifecycleError::Cart(e) => e.user_message(),
            LifecycleError::EmptyCart => "Your cart is empty.".into(),
            LifecycleError::ActiveOrderExists(_) => MSG_FINISH_ORDER.into(),
            LifecycleError::UserNotFound(_) => "Please send /start first.".into(),
            LifecycleError::OrderNotFound(id) => format!("Order #{id} was not found."),
            LifecycleError::NotOrderOwner(id) => format!("Order #{id} is not yours."),
            LifecycleError::WrongExecutor(id) => format!("Order #{id} is assigned to another executor."),
            LifecycleError::PaymentAlreadyConfirmed(id) => {
                format!("You have already confirmed payment for order #{id}.")
            },
            LifecycleError::OrderNotPending(id, _) => format!("Order #{id} is no longer awaiting payment."),
            LifecycleError::PaymentNotConfirmed(id) => format!("Payment for order #{id} has not been confirmed yet."),
            LifecycleError::IllegalTransition { order, from, .. } => {
                format!("Order #{order} cannot be changed while it is {}.", from.to_string().replace('_', " "))
            },
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DatabaseError(s) => LifecycleError::StoreUnavailable(s),
            StoreError::UserNotFound(id) => LifecycleError::UserNotFound(id),
            StoreError::OrderNotFound(id) => LifecycleError::OrderNotFound(id),
            StoreError::IllegalTransition { order, from, to } => LifecycleError::IllegalTransition { order, from, to },
            StoreError::PaymentAlreadyConfirmed(id) => LifecycleError::PaymentAlreadyConfirmed(id),
            StoreError::OrderNotPending(id, status) => LifecycleError::OrderNotPending(id, status),
            StoreError::PaymentNotConfirmed(id) => LifecycleError::PaymentNotConfirmed(id),
        }
    }
}

impl From<CartError> for LifecycleError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::Store(e) => e.into(),
            e => LifecycleError::Cart(e),
        }
    }
}
