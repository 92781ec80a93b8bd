//! Outbound notifications.
//!
//! The chat transport implements [`Notifier`] to deliver plain-text messages to users. Delivery is fire-and-forget
//! from the engine's point of view: failures are logged and never undo a state transition.
use async_trait::async_trait;
use thiserror::Error;

use crate::db_types::ExternalId;

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("Recipient {0} cannot be reached")]
    Unreachable(ExternalId),
    #[error("Notification transport failure: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: ExternalId, text: String) -> Result<(), NotifyError>;
}
