// Trivia game logic - question fetching, token handling, and session ownership.
//
// The service is platform-agnostic: the Discord layer asks it for questions
// and a session guard, then drives the present/await/judge loop itself.

use super::trivia_models::{
    Category, Difficulty, QuestionBatch, QuestionKind, QuestionQuery, ResponseCode,
    TriviaQuestion,
};
use super::trivia_sessions::{SessionGuard, TriviaSessions};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("A trivia game is already running in this channel!")]
    SessionActive,

    #[error("Unknown difficulty `{0}`. Use easy, medium or hard.")]
    InvalidDifficulty(String),

    #[error("Please ask for between 1 and {max} questions (you asked for {requested}).")]
    InvalidQuestionCount { requested: u32, max: u32 },

    #[error("The trivia API has no questions matching those options.")]
    NoResults,

    #[error("The trivia API rejected the request parameters.")]
    InvalidParameter,

    #[error("The trivia API is rate limiting us. Try again in a few seconds.")]
    RateLimited,

    #[error("Could not reach the trivia API: {0}")]
    Network(String),

    #[error("Could not read the trivia API response: {0}")]
    Decode(String),
}

// ============================================================================
// QUESTION SOURCE TRAIT (PORT)
// ============================================================================

/// Where questions come from. The production implementation talks to the
/// Open Trivia Database; tests use a scripted fake.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Ask for a fresh session token so later fetches avoid repeats.
    async fn request_token(&self) -> Result<String, TriviaError>;

    /// Reset an exhausted token so it can serve every question again.
    async fn reset_token(&self, token: &str) -> Result<(), TriviaError>;

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<QuestionBatch, TriviaError>;

    async fn categories(&self) -> Result<Vec<Category>, TriviaError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct TriviaConfig {
    /// How long a player has to answer one question.
    pub answer_timeout: Duration,
    /// Upper bound for multi-question games.
    pub max_questions: u32,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            answer_timeout: Duration::from_secs(30),
            max_questions: 20,
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct TriviaService<Q: QuestionSource> {
    source: Q,
    sessions: TriviaSessions,
    /// Lazily requested; replaced when the API forgets it.
    token: Mutex<Option<String>>,
    config: TriviaConfig,
}

impl<Q: QuestionSource> TriviaService<Q> {
    pub fn new(source: Q, config: TriviaConfig) -> Self {
        Self {
            source,
            sessions: TriviaSessions::new(),
            token: Mutex::new(None),
            config,
        }
    }

    pub fn answer_timeout(&self) -> Duration {
        self.config.answer_timeout
    }

    pub fn max_questions(&self) -> u32 {
        self.config.max_questions
    }

    pub fn sessions(&self) -> &TriviaSessions {
        &self.sessions
    }

    /// Claim the channel for a new game. Fails if a game is already running.
    pub fn start_game(&self, channel_id: u64, user_id: u64) -> Result<SessionGuard, TriviaError> {
        let guard = self.sessions.open(channel_id, user_id)?;
        tracing::info!(channel_id, user_id, "Trivia session opened");
        Ok(guard)
    }

    /// Turn an optional user-supplied difficulty into a filter.
    /// Missing or blank means "any difficulty".
    pub fn parse_difficulty(raw: Option<&str>) -> Result<Option<Difficulty>, TriviaError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s
                .parse::<Difficulty>()
                .map(Some)
                .map_err(TriviaError::InvalidDifficulty),
        }
    }

    /// Fetch up to `amount` four-answer questions.
    ///
    /// A missing or expired token is replaced (or reset) and the request is
    /// retried once. The API may return fewer questions than asked for.
    pub async fn fetch_questions(
        &self,
        amount: u32,
        difficulty: Option<Difficulty>,
        category: Option<u32>,
    ) -> Result<Vec<TriviaQuestion>, TriviaError> {
        if amount == 0 || amount > self.config.max_questions {
            return Err(TriviaError::InvalidQuestionCount {
                requested: amount,
                max: self.config.max_questions,
            });
        }

        // Held across the fetch so concurrent games don't race token refreshes.
        let mut token = self.token.lock().await;
        if token.is_none() {
            *token = Some(self.source.request_token().await?);
        }

        let mut query = QuestionQuery {
            amount,
            category,
            difficulty,
            kind: QuestionKind::Multiple,
            token: token.clone(),
        };

        let mut batch = self.source.fetch_questions(&query).await?;
        match batch.response_code {
            ResponseCode::TokenNotFound => {
                tracing::info!("Trivia token expired, requesting a new one");
                *token = Some(self.source.request_token().await?);
                query.token = token.clone();
                batch = self.source.fetch_questions(&query).await?;
            }
            ResponseCode::TokenEmpty => {
                if let Some(current) = token.as_deref() {
                    tracing::info!("Trivia token exhausted, resetting it");
                    self.source.reset_token(current).await?;
                }
                batch = self.source.fetch_questions(&query).await?;
            }
            _ => {}
        }
        drop(token);

        match batch.response_code {
            ResponseCode::Success => {}
            ResponseCode::NoResults => return Err(TriviaError::NoResults),
            ResponseCode::InvalidParameter => return Err(TriviaError::InvalidParameter),
            ResponseCode::RateLimited => return Err(TriviaError::RateLimited),
            ResponseCode::TokenNotFound | ResponseCode::TokenEmpty => {
                return Err(TriviaError::Network(
                    "trivia session token was rejected twice".to_string(),
                ))
            }
            ResponseCode::Unknown(code) => {
                return Err(TriviaError::Decode(format!(
                    "unexpected response code {}",
                    code
                )))
            }
        }

        let questions: Vec<TriviaQuestion> = batch
            .questions
            .into_iter()
            .filter(|q| q.incorrect_answers.len() == 3)
            .collect();

        if questions.is_empty() {
            return Err(TriviaError::NoResults);
        }

        tracing::debug!(
            requested = amount,
            received = questions.len(),
            "Fetched trivia questions"
        );
        Ok(questions)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, TriviaError> {
        self.source.categories().await
    }
}

// ============================================================================
// TESTS
// ============================================================================
