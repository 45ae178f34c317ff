use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name shared by every instance that should see each other's broadcasts.
pub const DEFAULT_CHANNEL_NAME: &str = "minicom_channel";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Simulated time before a send is confirmed or failed
    pub send_delay: Duration,
    /// Inactivity window after which a typing signal is cleared
    pub typing_debounce: Duration,
    /// Characters of the last message shown in a thread summary
    pub preview_length: usize,
    pub broadcast_capacity: usize,
    pub channel_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            send_delay: Duration::from_millis(600),
            typing_debounce: Duration::from_millis(500),
            preview_length: 40,
            broadcast_capacity: 1024,
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    pub fn with_typing_debounce(mut self, debounce: Duration) -> Self {
        self.typing_debounce = debounce;
        self
    }

    pub fn with_preview_length(mut self, length: usize) -> Self {
        self.preview_length = length;
        self
    }

    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = name.into();
        self
    }
}
