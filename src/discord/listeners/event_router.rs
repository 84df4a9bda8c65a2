// Event handler for non-command Discord events.
//
// poise dispatches prefix and slash commands on its own, so nothing here can
// block a command from running.

pub mod message_tracker;
pub mod qna;

use crate::discord::commands::presence;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Logged in as {}", data_about_bot.user.name);
            presence::on_ready(ctx, &data.command_prefix);
        }
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own)
            if new_message.author.bot {
                return Ok(());
            }

            message_tracker::track_message(data, new_message).await;

            if let Err(e) = qna::answer_mention(ctx, data, new_message).await {
                tracing::error!(
                    channel_id = new_message.channel_id.get(),
                    "Failed to answer mention: {}",
                    e
                );
            }
        }
        _ => {}
    }

    Ok(())
}
