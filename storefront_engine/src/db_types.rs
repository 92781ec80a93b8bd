use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use storefront_common::Amount;
use thiserror::Error;

pub const ORDER_STATUS_PENDING_PAYMENT: &str = "pending_payment";
pub const ORDER_STATUS_AWAITING_EXECUTOR_CONFIRMATION: &str = "awaiting_executor_confirmation";
pub const ORDER_STATUS_IN_PROGRESS: &str = "in_progress";
pub const ORDER_STATUS_COMPLETED: &str = "completed";
pub const ORDER_STATUS_CANCELLED: &str = "cancelled";

/// Defines an integer-backed identifier that maps transparently onto an SQL column.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }

            /// Identifiers issued by the store are always positive.
            pub fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }
    };
}

id_type!(
    /// Internal user identity
    UserId
);
id_type!(ItemId);
id_type!(CategoryId);
id_type!(GameId);
id_type!(OrderId);
id_type!(
    /// The identity of a user in the chat transport. Notifications are addressed to it.
    ExternalId
);

//--------------------------------------        Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Role {
    Client,
    Executor,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "Client"),
            Role::Executor => write!(f, "Executor"),
        }
    }
}

//--------------------------------------        User          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_id: ExternalId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_executor(&self) -> bool {
        self.role == Role::Executor
    }
}

//--------------------------------------       Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub game_id: GameId,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// Price in the smallest currency unit. Always positive.
    pub price: Amount,
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the client to pay.
    PendingPayment,
    /// An executor has been assigned and must verify the payment.
    AwaitingExecutorConfirmation,
    /// The executor verified the payment and is fulfilling the order.
    InProgress,
    /// The order has been fulfilled.
    Completed,
    /// The order was cancelled: payment timed out, was declined, or no executor could be found.
    Cancelled,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::PendingPayment => ORDER_STATUS_PENDING_PAYMENT,
            OrderStatusType::AwaitingExecutorConfirmation => ORDER_STATUS_AWAITING_EXECUTOR_CONFIRMATION,
            OrderStatusType::InProgress => ORDER_STATUS_IN_PROGRESS,
            OrderStatusType::Completed => ORDER_STATUS_COMPLETED,
            OrderStatusType::Cancelled => ORDER_STATUS_CANCELLED,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Completed | OrderStatusType::Cancelled)
    }

    /// The order state machine. Anything not listed here is an illegal transition.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (PendingPayment, AwaitingExecutorConfirmation) |
                (PendingPayment, Cancelled) |
                (AwaitingExecutorConfirmation, InProgress) |
                (AwaitingExecutorConfirmation, Cancelled) |
                (InProgress, Completed)
        )
    }

    pub fn non_terminal() -> [OrderStatusType; 3] {
        [OrderStatusType::PendingPayment, OrderStatusType::AwaitingExecutorConfirmation, OrderStatusType::InProgress]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ORDER_STATUS_PENDING_PAYMENT => Ok(Self::PendingPayment),
            ORDER_STATUS_AWAITING_EXECUTOR_CONFIRMATION => Ok(Self::AwaitingExecutorConfirmation),
            ORDER_STATUS_IN_PROGRESS => Ok(Self::InProgress),
            ORDER_STATUS_COMPLETED => Ok(Self::Completed),
            ORDER_STATUS_CANCELLED => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub client_id: UserId,
    pub executor_id: Option<UserId>,
    /// Sum of the cart line totals when the order was created. Never changes afterwards.
    pub total_amount: Amount,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub payment_deadline: DateTime<Utc>,
    pub payment_confirmed_by_user: bool,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// True while the payment watchdog is still allowed to cancel this order.
    pub fn awaits_payment(&self) -> bool {
        self.status == OrderStatusType::PendingPayment && !self.payment_confirmed_by_user
    }

    /// True when the client has paid but nobody has picked the order up yet.
    pub fn awaits_executor(&self) -> bool {
        self.status == OrderStatusType::PendingPayment && self.payment_confirmed_by_user && self.executor_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub client_id: UserId,
    pub total_amount: Amount,
    pub created_at: DateTime<Utc>,
    pub payment_deadline: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        client_id: UserId,
        total_amount: Amount,
        created_at: DateTime<Utc>,
        payment_deadline: DateTime<Utc>,
    ) -> Self {
        Self { client_id, total_amount, created_at, payment_deadline }
    }
}
