// Discord commands for message points.
//
// Thin translation layer: extract the author id, call the points service,
// format the result.

use crate::core::points::PointsError;
use crate::discord::{Context, Error};

/// Show how many points you have.
#[poise::command(prefix_command, slash_command)]
pub async fn points(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.to_string();

    let reply = match ctx.data().points.points_of(&user_id).await? {
        None => "You have no points yet.".to_string(),
        Some(points) => format!("You have {} points.", points),
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Add points to your own total.
#[poise::command(prefix_command, slash_command)]
pub async fn addpoints(
    ctx: Context<'_>,
    #[description = "Points to add (negative values subtract)"] amount: i64,
) -> Result<(), Error> {
    let user_id = ctx.author().id.to_string();

    match ctx
        .data()
        .points
        .add_points(&user_id, amount, "Manual addpoints command")
        .await
    {
        Ok(total) => {
            tracing::info!(user_id = %user_id, amount, total, "Points added manually");
            ctx.say(format!("Added {} points!", amount)).await?;
        }
        Err(PointsError::InvalidAmount) => {
            ctx.say("Adding 0 points wouldn't change anything. Pick a non-zero amount.")
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
