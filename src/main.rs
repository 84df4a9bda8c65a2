// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (database, HTTP APIs)
// - `discord/` = Discord-specific adapters (commands, listeners)
//
// This file's job is to:
// 1. Load configuration and set up logging
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::ai::{AiConfig, AiService};
use crate::core::points::{PointsConfig, PointsService};
use crate::core::trivia::{TriviaConfig, TriviaService};
use crate::discord::Data;
use crate::infra::ai::GeminiClient;
use crate::infra::points::SqlitePointsStore;
use crate::infra::trivia::OpenTriviaClient;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Either stdout or the log file, never both.
    let (stdout_layer, file_layer) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file));
            (None, Some(layer))
        }
        None => (Some(tracing_subscriber::fmt::layer()), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Also loads .env when present.
    let config = BotConfig::from_env()?;
    init_logging(config.log_file.as_deref())?;
    tracing::debug!(?config, "Configuration loaded");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let points_store = SqlitePointsStore::new(&config.database_url)
        .await
        .context("failed to initialize the points database")?;
    let points_service = Arc::new(PointsService::new_with_config(
        points_store,
        PointsConfig {
            trivia_points_per_correct: config.trivia_points_per_correct,
        },
    ));

    let trivia_client = OpenTriviaClient::new().context("failed to create trivia client")?;
    let trivia_service = Arc::new(TriviaService::new(
        trivia_client,
        TriviaConfig {
            answer_timeout: config.trivia_answer_timeout,
            max_questions: config.trivia_max_questions,
        },
    ));

    let ai_client = config
        .ai_api_key
        .clone()
        .map(GeminiClient::new)
        .transpose()
        .context("failed to create AI client")?;
    let ai_config = AiConfig {
        model: config.ai_model.clone(),
        ..AiConfig::default()
    };
    let ai_service = Arc::new(AiService::new(
        ai_client,
        config.ai_system_prompt.clone(),
        ai_config,
    ));
    if !ai_service.is_configured() {
        tracing::warn!("No GENAI_API_KEY set; mention replies will use the fallback text");
    }

    let data = Data {
        points: Arc::clone(&points_service),
        trivia: Arc::clone(&trivia_service),
        ai: Arc::clone(&ai_service),
        command_prefix: config.command_prefix.clone(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            // Event handler for messages and other events
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::listeners::event_handler(
                    ctx, event, framework, data,
                ))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            tracing::error!(command = %ctx.command().name, "Command failed: {}", error);
                            let _ = ctx.say("Something went wrong running that command.").await;
                        }
                        other => {
                            if let Err(e) = poise::builtins::on_error(other).await {
                                tracing::error!("Error while handling error: {}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("error creating client")?;

    client.start().await.context("error running bot")?;
    Ok(())
}
