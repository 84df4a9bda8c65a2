// The present -> wait -> judge loop, independent of any chat platform.
//
// A `TriviaTable` shows questions and collects replies; `play_game` drives
// it through every question and keeps score.

use super::trivia_models::{AnswerOutcome, GameSummary, PresentedQuestion, TriviaQuestion};
use super::trivia_service::TriviaError;
use super::trivia_sessions::SessionGuard;
use async_trait::async_trait;

/// How one question ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundResult {
    Answered(AnswerOutcome),
    /// No reply inside the answer window. Counts as wrong.
    TimedOut { correct: String },
}

/// Where a game is played: shows questions, waits for replies, reveals results.
#[async_trait]
pub trait TriviaTable: Send {
    type Error: From<TriviaError> + Send;

    /// Show the question and wait for the player's reply.
    /// `None` means the answer window closed without a reply.
    async fn ask(&mut self, question: &PresentedQuestion) -> Result<Option<String>, Self::Error>;

    async fn reveal(&mut self, round: &RoundResult) -> Result<(), Self::Error>;
}

/// Play every question in order and return the final score.
///
/// The guard keeps the channel claimed for the whole game; the caller drops it.
pub async fn play_game<T: TriviaTable>(
    guard: &SessionGuard,
    questions: &[TriviaQuestion],
    table: &mut T,
) -> Result<GameSummary, T::Error> {
    let total = questions.len();
    let mut summary = GameSummary::default();

    for (index, question) in questions.iter().enumerate() {
        let presented = guard.present(question, index + 1, total)?;

        let round = match table.ask(&presented).await? {
            Some(reply) => match guard.check_answer(&reply) {
                Some(outcome) => RoundResult::Answered(outcome),
                None => continue,
            },
            None => match guard.expire() {
                Some(correct) => RoundResult::TimedOut { correct },
                None => continue,
            },
        };

        summary.record(matches!(&round, RoundResult::Answered(o) if o.is_correct()));
        table.reveal(&round).await?;
    }

    tracing::debug!(
        channel_id = guard.channel_id(),
        user_id = guard.user_id(),
        correct = summary.correct,
        total = summary.total,
        "Trivia game finished"
    );
    Ok(summary)
}
