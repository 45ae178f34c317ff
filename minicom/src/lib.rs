//! # Minicom - live chat state for Rust
//!
//! Minicom keeps visitor/agent conversations consistent across several
//! instances of an application:
//! - **Optimistic sends** shown immediately, confirmed or failed after a delay
//! - **Typing indicators** that clear themselves after a short idle window
//! - **Read receipts** propagated to every instance
//! - **Local persistence** through a pluggable key-value store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use minicom::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = ChatAppBuilder::new().directory(".minicom").build().await?;
//!
//!     let visitor = app.connect().await?;
//!     let agent = app.connect().await?;
//!
//!     let sent = visitor.send_message("Hello", SenderId::Visitor).await;
//!     println!("{:?}", sent.map(|m| m.status));
//!
//!     for thread in agent.thread_list().await {
//!         println!("{} ({} unread): {}", thread.id, thread.unread_count, thread.last_message_preview);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **minicom-types**: messages, thread summaries, bus payloads, timings
//! - **minicom-persist**: storage adapter over durable and session key-value stores
//! - **minicom-store**: the thread store and inbox ordering
//! - **minicom-broadcast**: cross-instance bus with echo suppression
//! - **minicom-chat**: the session orchestrating sends, typing and receipts

pub use minicom_broadcast as broadcast;
pub use minicom_chat as chat;
pub use minicom_persist as persist;
pub use minicom_store as store;
pub use minicom_types as types;

pub use minicom_broadcast::{BroadcastHub, HubRegistry, MessageBus};
pub use minicom_chat::{ChatSession, NetworkStatus, PendingSend};
pub use minicom_persist::{KeyValueStore, StorageAdapter};
pub use minicom_store::ThreadStore;
pub use minicom_types::{ChatConfig, Message, MessageStatus, SenderId, Thread};

/// High-level builder wiring storage, hub and sessions
pub mod builder;

/// Convenient prelude with commonly used types
pub mod prelude {
    pub use crate::builder::{ChatApp, ChatAppBuilder};
    pub use crate::chat::{ChatSession, NetworkStatus};
    pub use crate::types::{ChatConfig, Message, MessageStatus, SenderId, Thread};
    pub use anyhow::Result;
}
