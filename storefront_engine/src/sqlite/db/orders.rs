use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, Role, UserId},
    sqlite::db::{returned_row, users},
    traits::{AssignOutcome, StoreError},
};

/// Inserts a new order into the database using the given connection. This is not atomic. Embed the call in a
/// transaction if the client check and the insert must see the same snapshot, and pass `&mut *tx` as the connection.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    if users::fetch_user(order.client_id, &mut *conn).await?.is_none() {
        return Err(StoreError::UserNotFound(order.client_id));
    }
    let rows: Vec<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (
                client_id,
                total_amount,
                status,
                created_at,
                payment_deadline,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $4)
            RETURNING *;
        "#,
    )
    .bind(order.client_id)
    .bind(order.total_amount)
    .bind(OrderStatusType::PendingPayment)
    .bind(order.created_at)
    .bind(order.payment_deadline)
    .fetch_all(conn)
    .await?;
    let order = returned_row(rows)?;
    debug!("🗃️ Order #{} inserted for client {} ({})", order.id, order.client_id, order.total_amount);
    Ok(order)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_orders_by_status(
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE status = $1 ORDER BY created_at, id").bind(status).fetch_all(conn).await
}

/// Returns the most recent order for the client that is not completed or cancelled.
pub async fn fetch_active_order(client: UserId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE client_id = $1 AND status IN ($2, $3, $4)
        ORDER BY id DESC LIMIT 1
        "#,
    )
    .bind(client)
    .bind(OrderStatusType::PendingPayment)
    .bind(OrderStatusType::AwaitingExecutorConfirmation)
    .bind(OrderStatusType::InProgress)
    .fetch_optional(conn)
    .await
}

/// Compare-and-set status update. Returns `None` if the order is not in the `expected` status (or does not exist).
pub async fn cas_status(
    id: OrderId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    trace!("🗃️ Order #{id}: {expected} -> {new_status}");
    let mut rows = sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND status = $3
        RETURNING *
        "#,
    )
    .bind(new_status)
    .bind(id)
    .bind(expected)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}

/// Sets the payment flag, but only on a `pending_payment` order whose flag is still clear.
pub async fn cas_payment_confirmed(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let mut rows = sqlx::query_as(
        r#"
        UPDATE orders SET payment_confirmed_by_user = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $1 AND status = $2 AND payment_confirmed_by_user = 0
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(OrderStatusType::PendingPayment)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}

/// Picks the first executor (by id) that has no order in progress and attaches them to the order in a single
/// statement. Returns `None` if no executor is free or the order is not eligible for assignment.
pub async fn cas_assign_free_executor(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let mut rows = sqlx::query_as(
        r#"
        UPDATE orders SET
            executor_id = (
                SELECT users.id FROM users
                WHERE users.role = $1 AND users.id NOT IN (
                    SELECT busy.executor_id FROM orders AS busy
                    WHERE busy.status = $2 AND busy.executor_id IS NOT NULL
                )
                ORDER BY users.id LIMIT 1
            ),
            status = $3,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $4
          AND executor_id IS NULL
          AND status = $5
          AND payment_confirmed_by_user = 1
          AND EXISTS (
                SELECT 1 FROM users
                WHERE users.role = $1 AND users.id NOT IN (
                    SELECT busy.executor_id FROM orders AS busy
                    WHERE busy.status = $2 AND busy.executor_id IS NOT NULL
                )
          )
        RETURNING *
        "#,
    )
    .bind(Role::Executor)
    .bind(OrderStatusType::InProgress)
    .bind(OrderStatusType::AwaitingExecutorConfirmation)
    .bind(id)
    .bind(OrderStatusType::PendingPayment)
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}

/// Works out why a compare-and-set on the order status did not apply.
pub async fn explain_failed_transition(
    id: OrderId,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<StoreError, StoreError> {
    let order = fetch_order(id, conn).await?.ok_or(StoreError::OrderNotFound(id))?;
    Ok(StoreError::IllegalTransition { order: id, from: order.status, to })
}

/// Classifies an order for which [`cas_assign_free_executor`] did not apply.
pub async fn explain_failed_assignment(id: OrderId, conn: &mut SqliteConnection) -> Result<AssignOutcome, StoreError> {
    let order = fetch_order(id, conn).await?.ok_or(StoreError::OrderNotFound(id))?;
    if order.executor_id.is_some() {
        return Ok(AssignOutcome::AlreadyAssigned(order));
    }
    if order.status != OrderStatusType::PendingPayment {
        return Err(StoreError::OrderNotPending(id, order.status));
    }
    if !order.payment_confirmed_by_user {
        return Err(StoreError::PaymentNotConfirmed(id));
    }
    Ok(AssignOutcome::NoExecutor)
}
