// Trivia domain models.
//
// Questions reach this layer already decoded to plain text; base64 handling
// and the wire format belong to the infra client.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// The value the Open Trivia DB expects in the `difficulty` parameter.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Question type. Games always ask multiple choice (four answers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Multiple,
    #[allow(dead_code)]
    Boolean,
}

impl QuestionKind {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            QuestionKind::Multiple => "multiple",
            QuestionKind::Boolean => "boolean",
        }
    }
}

/// Parameters for one question batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub amount: u32,
    pub category: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub kind: QuestionKind,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaQuestion {
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Open Trivia DB `response_code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    NoResults,
    InvalidParameter,
    TokenNotFound,
    TokenEmpty,
    RateLimited,
    Unknown(i64),
}

impl From<i64> for ResponseCode {
    fn from(code: i64) -> Self {
        match code {
            0 => ResponseCode::Success,
            1 => ResponseCode::NoResults,
            2 => ResponseCode::InvalidParameter,
            3 => ResponseCode::TokenNotFound,
            4 => ResponseCode::TokenEmpty,
            5 => ResponseCode::RateLimited,
            other => ResponseCode::Unknown(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionBatch {
    pub response_code: ResponseCode,
    pub questions: Vec<TriviaQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

/// Labels shown next to the four answers.
pub const ANSWER_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// A question as shown to players, with answers already shuffled.
#[derive(Debug, Clone)]
pub struct PresentedQuestion {
    pub number: usize,
    pub total: usize,
    pub category: String,
    pub difficulty: String,
    pub question: String,
    pub answers: [String; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { answer: String },
    Incorrect { given: String, correct: String },
}

impl AnswerOutcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct { .. })
    }
}

/// Running score for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameSummary {
    pub correct: u32,
    pub total: u32,
}

impl GameSummary {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("EASY".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Medium ".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("insane".parse::<Difficulty>(), Err("insane".to_string()));
    }

    #[test]
    fn response_codes_map_from_api_values() {
        assert_eq!(ResponseCode::from(0), ResponseCode::Success);
        assert_eq!(ResponseCode::from(4), ResponseCode::TokenEmpty);
        assert_eq!(ResponseCode::from(5), ResponseCode::RateLimited);
        assert_eq!(ResponseCode::from(42), ResponseCode::Unknown(42));
    }

    #[test]
    fn summary_counts_answers() {
        let mut summary = GameSummary::default();
        summary.record(true);
        summary.record(false);
        summary.record(true);
        assert_eq!(summary, GameSummary { correct: 2, total: 3 });
    }
}
