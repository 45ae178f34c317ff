pub mod bus;
pub mod hub;
pub mod registry;

pub use bus::{MessageBus, PayloadStream};
pub use hub::{BroadcastHub, HubChannel};
pub use registry::HubRegistry;
