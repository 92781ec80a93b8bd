use crate::db_types::Order;

/// The result of trying to attach a free executor to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    /// An executor was found and the order moved to `awaiting_executor_confirmation`.
    Assigned(Order),
    /// The order already had an executor. Nothing was changed.
    AlreadyAssigned(Order),
    /// Every executor is busy (or none are registered). Nothing was changed.
    NoExecutor,
}

impl AssignOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            AssignOutcome::Assigned(o) | AssignOutcome::AlreadyAssigned(o) => Some(o),
            AssignOutcome::NoExecutor => None,
        }
    }
}
