pub mod ai_service;
pub mod formatting;
pub mod models;

pub use ai_service::{AiProvider, AiService, ERROR_PREFIX};
pub use formatting::{split_message, strip_mentions, DISCORD_MESSAGE_LIMIT};
pub use models::{AiConfig, AiError};
