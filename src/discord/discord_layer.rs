// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "listeners/event_router.rs"]
pub mod listeners;

use crate::core::ai::AiService;
use crate::core::points::PointsService;
use crate::core::trivia::TriviaService;
use crate::infra::ai::GeminiClient;
use crate::infra::points::SqlitePointsStore;
use crate::infra::trivia::OpenTriviaClient;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and listeners.
pub struct Data {
    pub points: Arc<PointsService<SqlitePointsStore>>,
    pub trivia: Arc<TriviaService<OpenTriviaClient>>,
    pub ai: Arc<AiService<GeminiClient>>,
    /// Text command prefix, shown in help output.
    pub command_prefix: String,
}
