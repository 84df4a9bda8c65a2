// Per-channel trivia session registry.
//
// A channel holds at most one session. Opening a session hands back a
// `SessionGuard`; the session lives exactly as long as the guard, so every
// way a game can end (answer, timeout, API error, panic) frees the channel.

use super::trivia_models::{AnswerOutcome, PresentedQuestion, TriviaQuestion, ANSWER_LABELS};
use super::trivia_service::TriviaError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// The question currently waiting for an answer.
#[derive(Debug, Clone)]
struct PendingQuestion {
    correct_answer: String,
    answers: [String; 4],
}

#[derive(Debug, Clone)]
struct TriviaSession {
    /// The user who started the game; only their replies count.
    user_id: u64,
    current: Option<PendingQuestion>,
}

/// Shared map of channel id -> active session.
#[derive(Clone, Default)]
pub struct TriviaSessions {
    sessions: Arc<DashMap<u64, TriviaSession>>,
}

impl TriviaSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `channel_id` for a new game.
    ///
    /// The vacancy check and the insert happen under one shard lock, so two
    /// commands racing on the same channel cannot both succeed.
    pub fn open(&self, channel_id: u64, user_id: u64) -> Result<SessionGuard, TriviaError> {
        match self.sessions.entry(channel_id) {
            Entry::Occupied(_) => Err(TriviaError::SessionActive),
            Entry::Vacant(slot) => {
                slot.insert(TriviaSession {
                    user_id,
                    current: None,
                });
                Ok(SessionGuard {
                    sessions: Arc::clone(&self.sessions),
                    channel_id,
                    user_id,
                })
            }
        }
    }

    pub fn is_active(&self, channel_id: u64) -> bool {
        self.sessions.contains_key(&channel_id)
    }

    #[allow(dead_code)]
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Ownership of one channel's session. Dropping it ends the session.
pub struct SessionGuard {
    sessions: Arc<DashMap<u64, TriviaSession>>,
    channel_id: u64,
    user_id: u64,
}

impl SessionGuard {
    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Shuffle the answers, remember the correct one, and return what the
    /// players should see.
    pub fn present(
        &self,
        question: &TriviaQuestion,
        number: usize,
        total: usize,
    ) -> Result<PresentedQuestion, TriviaError> {
        let mut answers: Vec<String> = Vec::with_capacity(4);
        answers.push(question.correct_answer.clone());
        answers.extend(question.incorrect_answers.iter().cloned());
        answers.shuffle(&mut rand::thread_rng());

        let answers: [String; 4] = answers.try_into().map_err(|v: Vec<String>| {
            TriviaError::Decode(format!("expected 4 answers, got {}", v.len()))
        })?;

        if let Some(mut session) = self.sessions.get_mut(&self.channel_id) {
            session.current = Some(PendingQuestion {
                correct_answer: question.correct_answer.clone(),
                answers: answers.clone(),
            });
        }

        Ok(PresentedQuestion {
            number,
            total,
            category: question.category.clone(),
            difficulty: question.difficulty.clone(),
            question: question.question.clone(),
            answers,
        })
    }

    /// Judge a reply to the pending question and clear it.
    ///
    /// Accepts a label (`A`-`D`), the answer text, or a position (`1`-`4`),
    /// in that order of preference. Returns `None` when nothing is pending.
    pub fn check_answer(&self, reply: &str) -> Option<AnswerOutcome> {
        let pending = self.take_pending()?;
        let given = resolve_reply(reply, &pending.answers);

        if given.to_lowercase() == pending.correct_answer.to_lowercase() {
            Some(AnswerOutcome::Correct {
                answer: pending.correct_answer,
            })
        } else {
            Some(AnswerOutcome::Incorrect {
                given,
                correct: pending.correct_answer,
            })
        }
    }

    /// Give up on the pending question. Returns its correct answer.
    pub fn expire(&self) -> Option<String> {
        self.take_pending().map(|p| p.correct_answer)
    }

    fn take_pending(&self) -> Option<PendingQuestion> {
        self.sessions
            .get_mut(&self.channel_id)
            .and_then(|mut session| session.current.take())
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Only remove the entry we own.
        self.sessions
            .remove_if(&self.channel_id, |_, s| s.user_id == self.user_id);
        tracing::debug!(channel_id = self.channel_id, "Trivia session closed");
    }
}

/// Map a raw reply onto one of the presented answers when possible.
fn resolve_reply(reply: &str, answers: &[String; 4]) -> String {
    let trimmed = reply.trim();

    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let upper = c.to_ascii_uppercase();
        if let Some(idx) = ANSWER_LABELS.iter().position(|&l| l == upper) {
            return answers[idx].clone();
        }
    }

    let lowered = trimmed.to_lowercase();
    if let Some(answer) = answers.iter().find(|a| a.to_lowercase() == lowered) {
        return answer.clone();
    }

    if let Ok(n) = trimmed.parse::<usize>() {
        if (1..=answers.len()).contains(&n) {
            return answers[n - 1].clone();
        }
    }

    trimmed.to_string()
}
