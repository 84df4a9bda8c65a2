use super::models::{AiConfig, AiError};
use async_trait::async_trait;

/// Marker the chat layer shows in front of failed generations.
pub const ERROR_PREFIX: &str = "[error]";

/// Longest slice of the prompt echoed back by the fallback message.
const FALLBACK_PROMPT_CHARS: usize = 500;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a single free-text answer for `prompt`.
    async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        config: &AiConfig,
    ) -> Result<String, AiError>;
}

/// Question answering on top of an optional provider.
///
/// The bot keeps working without an API key: `generate_answer` never fails,
/// it returns a fallback or an `[error]`-prefixed message instead.
pub struct AiService<P: AiProvider> {
    provider: Option<P>,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: Option<P>, system_prompt: String, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt,
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn generate_answer(&self, prompt: &str) -> String {
        let Some(provider) = &self.provider else {
            return unavailable_message(prompt);
        };

        match provider
            .generate(&self.system_prompt, prompt, &self.config)
            .await
        {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => format!("{} {}", ERROR_PREFIX, AiError::EmptyResponse),
            Err(e) => {
                tracing::error!(model = %self.config.model, "AI generation failed: {}", e);
                format!("{} Failed to generate an answer: {}", ERROR_PREFIX, e)
            }
        }
    }
}

fn unavailable_message(prompt: &str) -> String {
    let short_prompt = if prompt.chars().count() > FALLBACK_PROMPT_CHARS {
        let head: String = prompt.chars().take(FALLBACK_PROMPT_CHARS).collect();
        format!("{}...", head)
    } else {
        prompt.to_string()
    };

    format!(
        "[AI unavailable: missing API key]\n\
         To enable AI responses, set `GENAI_API_KEY` in your .env.\n\
         Prompt received: {}",
        short_prompt
    )
}
