/// Notification gateway over the Bot API
pub mod gateway;
/// Update handlers feeding the dialog router
pub mod handlers;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// Keyboard and command-list conversion
pub mod views;

pub use gateway::TelegramGateway;
