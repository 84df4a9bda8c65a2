use crate::discord::{Context, Error};

/// Shows latency.
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(format!("Pong! {:.2}ms", latency.as_secs_f64() * 1000.0))
        .await?;
    Ok(())
}
