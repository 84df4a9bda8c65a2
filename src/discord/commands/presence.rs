// This module handles bot presence.
//
// Discord-layer glue only: we work with the SDK types (Context, ActivityData,
// OnlineStatus) and keep the logic short.

use poise::serenity_prelude as serenity;

/// Status line advertising the trivia help command.
pub fn status_text(prefix: &str) -> String {
    format!("trivia | {}trivia_help", prefix)
}

/// Called once the bot is ready so the default presence is set in one place.
pub fn on_ready(ctx: &serenity::Context, prefix: &str) {
    // serenity 0.12 exposes builder helpers on ActivityData, not Activity.
    let activity = serenity::ActivityData::playing(status_text(prefix));
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}
