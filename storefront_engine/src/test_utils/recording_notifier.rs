use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{
    db_types::ExternalId,
    notifier::{Notifier, NotifyError},
};

/// Keeps every delivered notification in memory. Can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ExternalId, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<(ExternalId, String)> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn messages_for(&self, recipient: ExternalId) -> Vec<String> {
        self.messages().into_iter().filter(|(r, _)| *r == recipient).map(|(_, text)| text).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: ExternalId, text: String) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Unreachable(recipient));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient, text));
        }
        Ok(())
    }
}
