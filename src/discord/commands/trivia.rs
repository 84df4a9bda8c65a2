// Discord commands for the trivia game.
//
// The core hands out a session guard and decoded questions; this file runs
// the present -> wait -> judge loop against the chat and reports the result.

use crate::core::points::activity_kind;
use crate::core::trivia::{
    play_game, AnswerOutcome, Category, GameSummary, PresentedQuestion, RoundResult,
    TriviaService, TriviaTable, ANSWER_LABELS,
};
use crate::discord::{Context, Error};
use crate::infra::trivia::OpenTriviaClient;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::time::Duration;

const DEFAULT_MULTI_QUESTIONS: u32 = 5;

/// Start a single trivia question.
///
/// Usage: `.trivia` or `.trivia easy|medium|hard`
#[poise::command(prefix_command, slash_command)]
pub async fn trivia(
    ctx: Context<'_>,
    #[description = "easy, medium or hard (default: any)"] difficulty: Option<String>,
    #[description = "Category id from trivia_categories"] category: Option<u32>,
) -> Result<(), Error> {
    run_game(ctx, 1, false, difficulty.as_deref(), category).await
}

/// Start a trivia game with multiple questions.
///
/// Usage: `.trivia_multi 5` or `.trivia_multi 10 hard`
#[poise::command(prefix_command, slash_command)]
pub async fn trivia_multi(
    ctx: Context<'_>,
    #[description = "Number of questions (default: 5)"] num_questions: Option<u32>,
    #[description = "easy, medium or hard (default: any)"] difficulty: Option<String>,
    #[description = "Category id from trivia_categories"] category: Option<u32>,
) -> Result<(), Error> {
    run_game(
        ctx,
        num_questions.unwrap_or(DEFAULT_MULTI_QUESTIONS),
        true,
        difficulty.as_deref(),
        category,
    )
    .await
}

/// List the trivia categories you can pick from.
#[poise::command(prefix_command, slash_command)]
pub async fn trivia_categories(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;

    let categories = match ctx.data().trivia.categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!("Failed to load trivia categories: {}", e);
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    let embed = serenity::CreateEmbed::new()
        .title("Trivia Categories")
        .description(render_categories(&categories))
        .color(0x3498DB)
        .footer(serenity::CreateEmbedFooter::new(
            "Pass the id as the category option of trivia or trivia_multi",
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Display help information for the trivia game.
#[poise::command(prefix_command, slash_command)]
pub async fn trivia_help(ctx: Context<'_>) -> Result<(), Error> {
    let prefix = &ctx.data().command_prefix;
    let timeout = ctx.data().trivia.answer_timeout().as_secs();
    let max = ctx.data().trivia.max_questions();
    let running = ctx
        .data()
        .trivia
        .sessions()
        .is_active(ctx.channel_id().get());

    let embed = serenity::CreateEmbed::new()
        .title("Trivia Help")
        .description(format!(
            "Answer with the letter (A-D), the number (1-4) or the answer itself. \
             You have {} seconds per question.",
            timeout
        ))
        .color(0x9B59B6)
        .field(
            format!("{}trivia [difficulty] [category]", prefix),
            "Play a single question.",
            false,
        )
        .field(
            format!("{}trivia_multi [count] [difficulty] [category]", prefix),
            format!(
                "Play several questions in a row (default {}, max {}).",
                DEFAULT_MULTI_QUESTIONS, max
            ),
            false,
        )
        .field(
            format!("{}trivia_categories", prefix),
            "List category ids.",
            false,
        )
        .field(
            "Difficulties",
            "`easy`, `medium`, `hard` or leave it out for any.",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(if running {
            "A game is running in this channel right now."
        } else {
            "One game per channel at a time."
        }));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Plays a game in the invoking channel through the chat.
struct ChannelTable<'a> {
    ctx: Context<'a>,
    timeout: Duration,
}

#[async_trait]
impl<'a> TriviaTable for ChannelTable<'a> {
    type Error = Error;

    async fn ask(&mut self, question: &PresentedQuestion) -> Result<Option<String>, Error> {
        self.ctx
            .send(poise::CreateReply::default().embed(question_embed(question, self.timeout)))
            .await?;

        // Only the player's next message in this channel counts.
        let reply = serenity::MessageCollector::new(self.ctx)
            .author_id(self.ctx.author().id)
            .channel_id(self.ctx.channel_id())
            .timeout(self.timeout)
            .await;

        Ok(reply.map(|message| message.content))
    }

    async fn reveal(&mut self, round: &RoundResult) -> Result<(), Error> {
        self.ctx.say(round_message(round)).await?;
        Ok(())
    }
}

async fn run_game(
    ctx: Context<'_>,
    amount: u32,
    is_multi: bool,
    difficulty: Option<&str>,
    category: Option<u32>,
) -> Result<(), Error> {
    let trivia = &ctx.data().trivia;
    let channel_id = ctx.channel_id();

    let difficulty = match TriviaService::<OpenTriviaClient>::parse_difficulty(difficulty) {
        Ok(difficulty) => difficulty,
        Err(e) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    // Held for the whole game; dropping it frees the channel on every path.
    let guard = match trivia.start_game(channel_id.get(), ctx.author().id.get()) {
        Ok(guard) => guard,
        Err(e) => {
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    ctx.defer().await?;

    let questions = match trivia.fetch_questions(amount, difficulty, category).await {
        Ok(questions) => questions,
        Err(e) => {
            tracing::warn!(channel_id = channel_id.get(), "Trivia fetch failed: {}", e);
            ctx.say(e.to_string()).await?;
            return Ok(());
        }
    };

    let mut table = ChannelTable {
        ctx,
        timeout: trivia.answer_timeout(),
    };
    let summary = play_game(&guard, &questions, &mut table).await?;
    drop(guard);

    if is_multi {
        ctx.say(game_over_message(&summary)).await?;
    }

    finish_game(ctx, &summary).await?;
    Ok(())
}

/// Award points and record the game. Storage failures are logged, not shown.
async fn finish_game(ctx: Context<'_>, summary: &GameSummary) -> Result<(), Error> {
    let points = &ctx.data().points;
    let user_id = ctx.author().id.to_string();

    match points.reward_trivia(&user_id, summary.correct).await {
        Ok(0) => {}
        Ok(awarded) => {
            ctx.say(format!("You earned **{}** points!", awarded)).await?;
        }
        Err(e) => tracing::error!(user_id = %user_id, "Failed to reward trivia points: {}", e),
    }

    let record = format!(
        "user {} scored {}/{} in channel {}",
        user_id,
        summary.correct,
        summary.total,
        ctx.channel_id()
    );
    if let Err(e) = points.log_activity(activity_kind::TRIVIA_GAME, record).await {
        tracing::warn!("Failed to record trivia activity: {}", e);
    }

    Ok(())
}

fn question_embed(question: &PresentedQuestion, timeout: Duration) -> serenity::CreateEmbed {
    let title = if question.total > 1 {
        format!("Trivia - Question {}/{}", question.number, question.total)
    } else {
        "Trivia".to_string()
    };

    serenity::CreateEmbed::new()
        .title(title)
        .description(format!(
            "**{}**\n\n{}",
            question.question,
            render_answers(question)
        ))
        .color(difficulty_colour(&question.difficulty))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "{} | {} | Reply within {}s",
            question.category,
            question.difficulty,
            timeout.as_secs()
        )))
}

fn render_answers(question: &PresentedQuestion) -> String {
    ANSWER_LABELS
        .iter()
        .zip(question.answers.iter())
        .map(|(label, answer)| format!("**{}.** {}", label, answer))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_categories(categories: &[Category]) -> String {
    if categories.is_empty() {
        return "No categories available right now.".to_string();
    }

    categories
        .iter()
        .map(|c| format!("`{:>2}` {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn round_message(round: &RoundResult) -> String {
    match round {
        RoundResult::Answered(AnswerOutcome::Correct { answer }) => {
            format!("✅ Correct! The answer was **{}**.", answer)
        }
        RoundResult::Answered(AnswerOutcome::Incorrect { correct, .. }) => {
            format!("❌ Wrong! The correct answer was **{}**.", correct)
        }
        RoundResult::TimedOut { correct } => {
            format!("⏰ Time's up! The correct answer was **{}**.", correct)
        }
    }
}

fn game_over_message(summary: &GameSummary) -> String {
    format!(
        "Game over! You scored {}/{}.",
        summary.correct, summary.total
    )
}

fn difficulty_colour(difficulty: &str) -> u32 {
    match difficulty.to_ascii_lowercase().as_str() {
        "easy" => 0x2ECC71,
        "medium" => 0xE67E22,
        "hard" => 0xE74C3C,
        _ => 0x95A5A6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presented() -> PresentedQuestion {
        PresentedQuestion {
            number: 2,
            total: 5,
            category: "Science: Computers".into(),
            difficulty: "hard".into(),
            question: "Which year was Rust 1.0 released?".into(),
            answers: [
                "2012".into(),
                "2015".into(),
                "2018".into(),
                "2010".into(),
            ],
        }
    }

    #[test]
    fn answers_are_labelled_in_order() {
        assert_eq!(
            render_answers(&presented()),
            "**A.** 2012\n**B.** 2015\n**C.** 2018\n**D.** 2010"
        );
    }

    #[test]
    fn round_messages_name_the_correct_answer() {
        let right = RoundResult::Answered(AnswerOutcome::Correct {
            answer: "2015".into(),
        });
        let wrong = RoundResult::Answered(AnswerOutcome::Incorrect {
            given: "2012".into(),
            correct: "2015".into(),
        });
        let late = RoundResult::TimedOut {
            correct: "2015".into(),
        };
        assert_eq!(round_message(&right), "✅ Correct! The answer was **2015**.");
        assert_eq!(
            round_message(&wrong),
            "❌ Wrong! The correct answer was **2015**."
        );
        assert_eq!(
            round_message(&late),
            "⏰ Time's up! The correct answer was **2015**."
        );
    }

    #[test]
    fn game_over_line_reports_single_question_games_too() {
        let summary = GameSummary {
            correct: 1,
            total: 1,
        };
        assert_eq!(game_over_message(&summary), "Game over! You scored 1/1.");
    }

    #[test]
    fn categories_render_with_ids() {
        let categories = vec![
            Category {
                id: 9,
                name: "General Knowledge".into(),
            },
            Category {
                id: 18,
                name: "Science: Computers".into(),
            },
        ];
        assert_eq!(
            render_categories(&categories),
            "` 9` General Knowledge\n`18` Science: Computers"
        );
        assert_eq!(
            render_categories(&[]),
            "No categories available right now."
        );
    }

    #[test]
    fn difficulty_colours() {
        assert_eq!(difficulty_colour("Easy"), 0x2ECC71);
        assert_eq!(difficulty_colour("hard"), 0xE74C3C);
        assert_eq!(difficulty_colour("unknown"), 0x95A5A6);
    }
}
