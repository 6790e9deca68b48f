//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `commands`: Bot commands and the tags used for routing
//! - `handlers`: Request handlers producing replies
//! - `dispatch`: Tag-to-handler routing and reply materialization
//! - `message_handler`: Teloxide endpoints sending replies to chats
//! - `ui_builder`: Formats the static bot texts

pub mod commands;
pub mod dispatch;
pub mod handlers;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use commands::{Command, CommandTag};
pub use dispatch::{dispatch, materialize, BotContext, Outgoing, Request};
pub use handlers::{DocumentReply, Reply};
pub use message_handler::{command_handler, text_handler};
