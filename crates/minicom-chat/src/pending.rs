use tokio::task::JoinHandle;
use tracing::error;

use minicom_types::Message;

/// A send that has been applied optimistically and is awaiting confirmation.
///
/// Dropping it does not cancel the confirmation; the store is updated either
/// way.
pub struct PendingSend {
    message: Message,
    confirmation: JoinHandle<Message>,
}

impl PendingSend {
    pub(crate) fn new(message: Message, confirmation: JoinHandle<Message>) -> Self {
        Self {
            message,
            confirmation,
        }
    }

    /// The message as inserted, still in `sending`
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn id(&self) -> &str {
        &self.message.id
    }

    /// Wait for the outcome: the message in `sent` or `error`.
    ///
    /// `None` only if the confirmation task was aborted or panicked.
    pub async fn confirmed(self) -> Option<Message> {
        match self.confirmation.await {
            Ok(message) => Some(message),
            Err(e) => {
                error!("Send confirmation for {} did not complete: {}", self.message.id, e);
                None
            }
        }
    }
}
