//! Session and transport client for a portfolio site's AI chat widget.
//!
//! [`widget::ChatWidget`] is the entry point: it owns the transcript, keeps the
//! tab's session id, and relays visitor messages to the chat backend.

pub mod config;
pub mod history;
pub mod logging;
pub mod message;
pub mod prompts;
pub mod session;
pub mod storage;
pub mod transcript;
pub mod transport;
pub mod widget;

pub use config::Config;
pub use message::{ChatMessage, ConversationRole, SendState};
pub use widget::ChatWidget;
