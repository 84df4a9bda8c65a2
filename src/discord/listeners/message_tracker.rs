use crate::discord::Data;
use poise::serenity_prelude as serenity;

/// One point per non-bot message, in guilds and DMs alike.
/// Storage failures are logged and never reach the user.
pub async fn track_message(data: &Data, message: &serenity::Message) {
    if message.author.bot {
        return;
    }

    let user_id = message.author.id.to_string();
    match data.points.track_message(&user_id).await {
        Ok(points) => {
            tracing::debug!(user_id = %user_id, points, "{} now has {} points", message.author.name, points);
        }
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                "Failed to update points for {}: {}",
                message.author.name,
                e
            );
        }
    }
}
