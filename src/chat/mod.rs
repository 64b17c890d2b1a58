pub mod context;
pub mod controller;
pub mod format;
pub mod session;

#[cfg(feature = "app")]
pub mod commands;

pub use context::{extract_context, ChatContext, ContextField};
pub use controller::ChatController;
pub use format::{format_message_with_context, format_message_with_defaults, PriceDefaults};
pub use session::ChatSession;
