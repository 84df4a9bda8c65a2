// Runtime configuration, read once at startup from the environment
// (and a `.env` file when present).

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PREFIX: &str = ".";
const DEFAULT_DATABASE_URL: &str = "data/signalrank.db";
const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";
/// Open Trivia DB serves at most 50 questions per request.
const OPENTDB_MAX_AMOUNT: u64 = 50;
const MAX_ANSWER_TIMEOUT_SECS: u64 = 600;
const MAX_POINTS_PER_CORRECT: u64 = 1_000_000;
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are SignalRank, a friendly Discord assistant. Answer clearly and keep it short.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.")]
    MissingToken,

    #[error("COMMAND_PREFIX must be exactly one character, got `{0}`")]
    InvalidPrefix(String),

    #[error("{name} must be a whole number from {min} to {max}, got `{value}`")]
    InvalidNumber {
        name: &'static str,
        value: String,
        min: u64,
        max: u64,
    },
}

#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub command_prefix: String,
    pub database_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_system_prompt: String,
    pub trivia_answer_timeout: Duration,
    pub trivia_max_questions: u32,
    pub trivia_points_per_correct: i64,
    pub log_file: Option<String>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::MissingToken)?;

        let command_prefix = get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if command_prefix.chars().count() != 1 {
            return Err(ConfigError::InvalidPrefix(command_prefix));
        }

        // Parse a whole number and require it to fall inside `range`.
        let number = |name: &'static str,
                      default: u64,
                      range: RangeInclusive<u64>|
         -> Result<u64, ConfigError> {
            let Some(value) = get(name) else {
                return Ok(default);
            };
            match value.parse::<u64>() {
                Ok(n) if range.contains(&n) => Ok(n),
                _ => Err(ConfigError::InvalidNumber {
                    name,
                    value,
                    min: *range.start(),
                    max: *range.end(),
                }),
            }
        };

        let timeout_secs = number("TRIVIA_ANSWER_TIMEOUT_SECS", 30, 1..=MAX_ANSWER_TIMEOUT_SECS)?;
        let max_questions = number("TRIVIA_MAX_QUESTIONS", 20, 1..=OPENTDB_MAX_AMOUNT)?;
        let points_per_correct =
            number("TRIVIA_POINTS_PER_CORRECT", 5, 0..=MAX_POINTS_PER_CORRECT)?;

        Ok(Self {
            discord_token,
            command_prefix,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            ai_api_key: get("GENAI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            ai_model: get("GENAI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            ai_system_prompt: get("AI_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            trivia_answer_timeout: Duration::from_secs(timeout_secs),
            // Both bounded above, so the narrowing casts are lossless.
            trivia_max_questions: max_questions as u32,
            trivia_points_per_correct: points_per_correct as i64,
            log_file: get("LOG_FILE"),
        })
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("command_prefix", &self.command_prefix)
            .field("database_url", &self.database_url)
            .field(
                "ai_api_key",
                &self.ai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("ai_model", &self.ai_model)
            .field("trivia_answer_timeout", &self.trivia_answer_timeout)
            .field("trivia_max_questions", &self.trivia_max_questions)
            .field("trivia_points_per_correct", &self.trivia_points_per_correct)
            .field("log_file", &self.log_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = load(&[("DISCORD_TOKEN", "abc")]).unwrap();

        assert_eq!(config.command_prefix, ".");
        assert_eq!(config.database_url, "data/signalrank.db");
        assert_eq!(config.ai_api_key, None);
        assert_eq!(config.ai_model, "gemini-2.5-flash");
        assert_eq!(config.trivia_answer_timeout, Duration::from_secs(30));
        assert_eq!(config.trivia_max_questions, 20);
        assert_eq!(config.trivia_points_per_correct, 5);
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn missing_or_blank_token_is_an_error() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::MissingToken);
        assert_eq!(
            load(&[("DISCORD_TOKEN", "   ")]).unwrap_err(),
            ConfigError::MissingToken
        );
    }

    #[test]
    fn prefix_must_be_one_character() {
        let err = load(&[("DISCORD_TOKEN", "abc"), ("COMMAND_PREFIX", "!!")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPrefix("!!".into()));

        let config = load(&[("DISCORD_TOKEN", "abc"), ("COMMAND_PREFIX", "!")]).unwrap();
        assert_eq!(config.command_prefix, "!");
    }

    #[test]
    fn google_key_is_a_fallback_for_genai_key() {
        let config = load(&[("DISCORD_TOKEN", "abc"), ("GOOGLE_API_KEY", "g")]).unwrap();
        assert_eq!(config.ai_api_key.as_deref(), Some("g"));

        let config = load(&[
            ("DISCORD_TOKEN", "abc"),
            ("GENAI_API_KEY", "primary"),
            ("GOOGLE_API_KEY", "g"),
        ])
        .unwrap();
        assert_eq!(config.ai_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn bad_numbers_are_reported_by_name() {
        let err = load(&[("DISCORD_TOKEN", "abc"), ("TRIVIA_MAX_QUESTIONS", "lots")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "TRIVIA_MAX_QUESTIONS",
                value: "lots".into(),
                min: 1,
                max: 50,
            }
        );
    }

    #[test]
    fn out_of_range_trivia_settings_are_rejected() {
        for (name, value) in [
            ("TRIVIA_MAX_QUESTIONS", "0"),
            ("TRIVIA_MAX_QUESTIONS", "51"),
            ("TRIVIA_ANSWER_TIMEOUT_SECS", "0"),
            ("TRIVIA_POINTS_PER_CORRECT", "-5"),
        ] {
            let err = load(&[("DISCORD_TOKEN", "abc"), (name, value)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidNumber { name: n, value: v, .. } if *n == name && v == value),
                "{} = {} gave {:?}",
                name,
                value,
                err
            );
        }

        let config = load(&[
            ("DISCORD_TOKEN", "abc"),
            ("TRIVIA_MAX_QUESTIONS", "50"),
            ("TRIVIA_ANSWER_TIMEOUT_SECS", "1"),
            ("TRIVIA_POINTS_PER_CORRECT", "0"),
        ])
        .unwrap();
        assert_eq!(config.trivia_max_questions, 50);
        assert_eq!(config.trivia_answer_timeout, Duration::from_secs(1));
        assert_eq!(config.trivia_points_per_correct, 0);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = load(&[("DISCORD_TOKEN", "super-secret"), ("GENAI_API_KEY", "key-123")]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("key-123"));
        assert!(debug.contains("<redacted>"));
    }
}
