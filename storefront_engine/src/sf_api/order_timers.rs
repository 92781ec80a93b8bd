use std::{collections::HashMap, fmt::Display, future::Future, sync::Arc};

use log::*;
use tokio::{sync::Mutex, task::JoinHandle};

use crate::db_types::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Cancels the order if payment is not confirmed by the deadline.
    PaymentWatchdog,
    /// One-shot re-run of executor matching after no executor was free.
    ExecutorRetry,
}

impl Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerKind::PaymentWatchdog => write!(f, "payment watchdog"),
            TimerKind::ExecutorRetry => write!(f, "executor retry"),
        }
    }
}

/// Background timer tasks, tracked per (order, timer kind).
///
/// Timers are not cancelled when an order resolves early. Each timer re-reads the order before acting.
#[derive(Clone, Default)]
pub struct OrderTimers {
    tasks: Arc<Mutex<HashMap<(OrderId, TimerKind), JoinHandle<()>>>>,
}

impl OrderTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` as the `kind` timer of `order`. A timer that is already armed for the same order and kind is kept,
    /// and `task` is dropped. Returns `true` if the task was spawned.
    pub async fn arm<F>(&self, order: OrderId, kind: TimerKind, task: F) -> bool
    where F: Future<Output = ()> + Send + 'static {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|_, handle| !handle.is_finished());
        if tasks.contains_key(&(order, kind)) {
            debug!("🕰️ The {kind} for order #{order} is already armed");
            return false;
        }
        tasks.insert((order, kind), tokio::spawn(task));
        debug!("🕰️ Armed the {kind} for order #{order}");
        true
    }

    /// The number of timers that have not fired yet.
    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.values().filter(|h| !h.is_finished()).count()
    }

    pub async fn is_armed(&self, order: OrderId, kind: TimerKind) -> bool {
        self.tasks.lock().await.get(&(order, kind)).map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Waits for the given timer to run to completion. Returns `false` if no such timer is tracked, or it was aborted.
    pub async fn wait_for(&self, order: OrderId, kind: TimerKind) -> bool {
        let handle = self.tasks.lock().await.remove(&(order, kind));
        match handle {
            Some(handle) => match handle.await {
                Ok(()) => true,
                Err(e) => {
                    warn!("🕰️ The {kind} for order #{order} did not complete. {e}");
                    false
                },
            },
            None => false,
        }
    }

    /// Aborts every outstanding timer.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        let count = tasks.len();
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
        info!("🕰️ {count} order timers stopped");
    }
}
