//! Terminal driver for Minicom: a visitor and an agent chatting through one
//! broadcast hub, driven by line commands.

pub mod commands;
pub mod config;
pub mod render;
pub mod state;

pub use commands::{execute, Command, Outcome, ParseError};
pub use config::Config;
pub use state::AppState;
