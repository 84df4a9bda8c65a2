// Trivia module - Open Trivia DB games with one session per channel

mod trivia_game;
mod trivia_models;
mod trivia_service;
mod trivia_sessions;

pub use trivia_game::{play_game, RoundResult, TriviaTable};
pub use trivia_models::{
    AnswerOutcome, Category, GameSummary, PresentedQuestion, QuestionBatch, QuestionQuery,
    ResponseCode, TriviaQuestion, ANSWER_LABELS,
};
pub use trivia_service::{QuestionSource, TriviaConfig, TriviaError, TriviaService};

#[cfg(test)]
pub use trivia_models::{Difficulty, QuestionKind};
#[cfg(test)]
pub use trivia_sessions::TriviaSessions;
