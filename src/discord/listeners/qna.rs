// Mention-triggered question answering.

use crate::core::ai::{split_message, strip_mentions, DISCORD_MESSAGE_LIMIT, ERROR_PREFIX};
use crate::core::points::activity_kind;
use crate::discord::Data;
use poise::serenity_prelude as serenity;

const EMPTY_PROMPT_REPLY: &str = "Hi - mention me with a question and I'll try to answer it.";

/// Answer a message that mentions the bot. Other messages are ignored.
pub async fn answer_mention(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
) -> Result<(), serenity::Error> {
    if message.author.bot {
        return Ok(());
    }

    let bot_id = ctx.cache.current_user().id;
    if !message.mentions.iter().any(|u| u.id == bot_id) {
        return Ok(());
    }

    let mention_ids: Vec<u64> = message.mentions.iter().map(|u| u.id.get()).collect();
    let prompt = strip_mentions(&message.content, &mention_ids);
    if prompt.is_empty() {
        message.channel_id.say(&ctx.http, EMPTY_PROMPT_REPLY).await?;
        return Ok(());
    }

    // Typing indicator stays up until dropped.
    let typing = message.channel_id.start_typing(&ctx.http);
    let answer = data.ai.generate_answer(&prompt).await;
    typing.stop();

    if was_answered(data.ai.is_configured(), &answer) {
        if let Err(e) = data
            .points
            .log_activity(activity_kind::AI_QUESTION, prompt.clone())
            .await
        {
            tracing::warn!("Failed to record AI question: {}", e);
        }
    }

    send_answer(ctx, message, &answer).await
}

/// Only real model answers count, not the missing-key fallback or error replies.
fn was_answered(ai_configured: bool, answer: &str) -> bool {
    ai_configured && !answer.starts_with(ERROR_PREFIX)
}

/// Reply with the first chunk, then post the rest to the channel.
async fn send_answer(
    ctx: &serenity::Context,
    message: &serenity::Message,
    answer: &str,
) -> Result<(), serenity::Error> {
    let mut chunks = answer_messages(answer).into_iter();
    let Some(first) = chunks.next() else {
        return Ok(());
    };

    if let Err(e) = message
        .channel_id
        .send_message(&ctx.http, first.clone().reference_message(message))
        .await
    {
        tracing::warn!("Reply failed, falling back to a plain message: {}", e);
        message.channel_id.send_message(&ctx.http, first).await?;
    }

    for chunk in chunks {
        message.channel_id.send_message(&ctx.http, chunk).await?;
    }

    Ok(())
}

/// Split an answer into Discord-sized messages that ping nobody, the
/// replied-to author included.
fn answer_messages(answer: &str) -> Vec<serenity::CreateMessage> {
    split_message(answer, DISCORD_MESSAGE_LIMIT)
        .into_iter()
        .map(|chunk| {
            serenity::CreateMessage::new()
                .content(chunk)
                .allowed_mentions(serenity::CreateAllowedMentions::new().replied_user(false))
        })
        .collect()
}
