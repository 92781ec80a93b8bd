use async_trait::async_trait;
use log::*;
use storefront_engine::{
    db_types::ExternalId,
    notifier::{Notifier, NotifyError},
};

/// Writes every notification to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: ExternalId, text: String) -> Result<(), NotifyError> {
        info!("📨️ To {recipient}: {text}");
        Ok(())
    }
}
