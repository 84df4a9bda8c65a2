use crate::core::points::User;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const LEADERBOARD_SIZE: usize = 10;
const LEADERBOARD_COLOUR: u32 = 0xFFD700;

/// Show the ten users with the most points.
#[poise::command(prefix_command, slash_command)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let top = ctx.data().points.leaderboard(LEADERBOARD_SIZE).await?;

    if top.is_empty() {
        ctx.say("Leaderboard is empty.").await?;
        return Ok(());
    }

    // Cache lookup only; the guard must not live across an await.
    let icon = ctx.guild().and_then(|guild| guild.icon_url());

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Leaderboard - Top {} Users", LEADERBOARD_SIZE))
        .description(render_lines(&top))
        .color(LEADERBOARD_COLOUR);

    if let Some(url) = icon {
        embed = embed.thumbnail(url);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// One `**#rank - <mention>:** N points` line per user.
fn render_lines(users: &[User]) -> String {
    users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            format!(
                "**#{} - <@{}>:** {} points",
                i + 1,
                user.discord_id,
                user.points
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
