//! Chat orchestration for Minicom.
//!
//! A [`ChatSession`] owns one instance's [`ThreadStore`](minicom_store::ThreadStore)
//! and keeps it in sync with peers over a
//! [`MessageBus`](minicom_broadcast::MessageBus): outgoing messages are shown
//! at once and confirmed after a delay, typing indicators clear themselves,
//! and read receipts propagate.

pub mod builder;
pub mod debounce;
pub mod delivery;
pub mod error;
pub mod network;
pub mod pending;
pub mod session;

pub use builder::ChatSessionBuilder;
pub use debounce::Debouncer;
pub use delivery::SimulatedDelivery;
pub use error::DeliveryError;
pub use network::NetworkStatus;
pub use pending::PendingSend;
pub use session::{ChatSession, TypingMap};

pub use minicom_types::{BroadcastPayload, ChatConfig, Message, MessageStatus, SenderId, Thread};
