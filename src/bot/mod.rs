//! Bot module for handling Telegram interactions
//!
//! This module is the thin transport adapter around the dialogue engine:
//! - `message_handler`: maps incoming messages to engine events and
//!   delivers the replies and report artifacts back to the chat
//! - `ui_builder`: creates the reply keyboard

pub mod message_handler;
pub mod ui_builder;

pub use message_handler::{message_handler, parse_command};
pub use ui_builder::main_keyboard;
