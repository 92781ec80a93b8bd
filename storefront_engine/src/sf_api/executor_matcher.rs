use log::*;

use crate::{
    db_types::OrderId,
    traits::{AssignOutcome, OrderManagement, StoreError},
};

/// Selects a free executor for a paid order and performs the assignment transition.
///
/// An executor is free when no order assigned to them is `in_progress`. Executors are tried in id order, so with
/// several free executors the one registered first is chosen.
#[derive(Clone)]
pub struct ExecutorMatcher<B> {
    db: B,
}

impl<B> ExecutorMatcher<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ExecutorMatcher<B>
where B: OrderManagement
{
    /// Attaches a free executor to the order and moves it to `awaiting_executor_confirmation`.
    ///
    /// Returns [`AssignOutcome::NoExecutor`] without changing anything when nobody is free, and
    /// [`AssignOutcome::AlreadyAssigned`] when the order already has an executor.
    pub async fn assign(&self, order_id: OrderId) -> Result<AssignOutcome, StoreError> {
        let outcome = self.db.assign_free_executor(order_id).await?;
        match &outcome {
            AssignOutcome::Assigned(order) => {
                info!("🔄️👷️ Order #{order_id} assigned to executor {:?}", order.executor_id)
            },
            AssignOutcome::AlreadyAssigned(order) => {
                debug!("🔄️👷️ Order #{order_id} already has executor {:?}", order.executor_id)
            },
            AssignOutcome::NoExecutor => info!("🔄️👷️ No free executor for order #{order_id}"),
        }
        Ok(outcome)
    }
}
