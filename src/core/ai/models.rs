use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Usually means the answer was blocked by safety filters.
    #[error("the model returned no text")]
    EmptyResponse,

    #[error("could not decode response: {0}")]
    Decode(String),
}
