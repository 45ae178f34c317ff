pub mod config;
pub mod events;
pub mod state;

pub use config::{ChatConfig, DEFAULT_CHANNEL_NAME};
pub use events::{BroadcastPayload, ReadReceipt, TypingPayload};
pub use state::{now_millis, Message, MessageStatus, SenderId, Thread, ThreadState};
