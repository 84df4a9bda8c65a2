// =============================================================================
// GEMINI CLIENT - Google AI Studio API Integration
// =============================================================================
//
// Implements `AiProvider` against the Gemini `generateContent` endpoint
// (https://ai.google.dev/api/generate-content).
//
// - Authentication: the API key goes in the `x-goog-api-key` header.
// - Request format: `contents[]` with nested `parts`; the system prompt is the
//   separate top-level `systemInstruction` field.
// - Response format: text lives at `candidates[0].content.parts[*].text`.
//
// If the configured model does not exist (HTTP 404) the client lists the
// models available to the key, picks one that supports `generateContent`,
// retries once, and keeps using that model afterwards.

use crate::core::ai::{AiConfig, AiError, AiProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// GEMINI API DATA STRUCTURES
// =============================================================================

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    /// Set on parts that carry the model's thinking rather than the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    /// Fully qualified, e.g. `models/gemini-2.5-flash`.
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

// =============================================================================
// GEMINI CLIENT IMPLEMENTATION
// =============================================================================

pub struct GeminiClient {
    client: Client,
    api_key: String,
    /// Model picked after the configured one came back 404.
    fallback_model: Mutex<Option<String>>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            fallback_model: Mutex::new(None),
        })
    }

    fn text_content(role: Option<&str>, text: &str) -> Content {
        Content {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
                thought: None,
            }],
        }
    }

    fn build_request(system_prompt: &str, prompt: &str, config: &AiConfig) -> GenerateContentRequest {
        let system_instruction = if system_prompt.trim().is_empty() {
            None
        } else {
            Some(Self::text_content(None, system_prompt))
        };

        GenerateContentRequest {
            contents: vec![Self::text_content(Some("user"), prompt)],
            system_instruction,
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        }
    }

    fn current_model(&self, config: &AiConfig) -> String {
        self.fallback_model
            .lock()
            .ok()
            .and_then(|m| m.clone())
            .unwrap_or_else(|| config.model.clone())
    }

    async fn generate_with_model(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", API_BASE, model);

        tracing::debug!(model, "Sending Gemini request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        parse_generate_response(&body)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, AiError> {
        let response = self
            .client
            .get(format!("{}/models", API_BASE))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: ListModelsResponse =
            serde_json::from_str(&body).map_err(|e| AiError::Decode(e.to_string()))?;
        Ok(parsed.models)
    }
}

fn api_error(status: StatusCode, body: &str) -> AiError {
    // Prefer the structured message when the body is a Gemini error object.
    let message = serde_json::from_str::<GeminiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    AiError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Join the answer parts of the first candidate, skipping thinking parts.
fn parse_generate_response(body: &str) -> Result<String, AiError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AiError::Decode(e.to_string()))?;

    let content = parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .ok_or(AiError::EmptyResponse)?;

    let text: String = content
        .parts
        .into_iter()
        .filter(|p| p.thought != Some(true))
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        Err(AiError::EmptyResponse)
    } else {
        Ok(text)
    }
}

/// Pick a replacement model: a Gemini model that can generate content,
/// otherwise anything that can.
fn pick_fallback_model(models: &[ModelInfo]) -> Option<String> {
    let can_generate =
        |m: &&ModelInfo| m.supported_generation_methods.iter().any(|g| g == "generateContent");

    models
        .iter()
        .filter(can_generate)
        .find(|m| m.name.contains("gemini"))
        .or_else(|| models.iter().find(can_generate))
        .map(|m| m.name.trim_start_matches("models/").to_string())
}

#[async_trait]
impl AiProvider for GeminiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        config: &AiConfig,
    ) -> Result<String, AiError> {
        let request = Self::build_request(system_prompt, prompt, config);
        let model = self.current_model(config);

        match self.generate_with_model(&model, &request).await {
            Err(AiError::Api { status: 404, .. }) => {
                tracing::warn!(model = %model, "Gemini model not found, looking for a replacement");
                let models = self.list_models().await?;
                let replacement = pick_fallback_model(&models).ok_or_else(|| AiError::Api {
                    status: 404,
                    message: format!(
                        "model `{}` not found and no model supports generateContent",
                        model
                    ),
                })?;

                let answer = self.generate_with_model(&replacement, &request).await?;
                tracing::info!(model = %replacement, "Using fallback Gemini model");
                if let Ok(mut slot) = self.fallback_model.lock() {
                    *slot = Some(replacement);
                }
                Ok(answer)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn request_uses_system_instruction_and_camel_case() {
        let config = AiConfig {
            model: "gemini-2.5-flash".into(),
            temperature: 0.5,
            max_tokens: Some(256),
        };
        let request = GeminiClient::build_request("Be nice.", "Hello?", &config);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello?");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be nice.");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let request = GeminiClient::build_request("  ", "Hello?", &AiConfig::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn response_text_skips_thoughts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[
            {"text":"thinking...","thought":true},
            {"text":"Paris"},
            {"text":" is the capital."}
        ]}}]}"#;
        assert_eq!(
            parse_generate_response(body).unwrap(),
            "Paris is the capital."
        );
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        assert!(matches!(
            parse_generate_response(r#"{"candidates":[]}"#),
            Err(AiError::EmptyResponse)
        ));
        assert!(matches!(
            parse_generate_response(r#"{}"#),
            Err(AiError::EmptyResponse)
        ));
    }

    #[test]
    fn api_error_prefers_structured_message() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"models/nope is not found","status":"NOT_FOUND"}}"#,
        );
        match err {
            AiError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "models/nope is not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn fallback_prefers_gemini_models_that_generate() {
        let models = vec![
            model("models/embedding-001", &["embedContent"]),
            model("models/text-bison", &["generateContent"]),
            model("models/gemini-2.0-flash", &["generateContent", "countTokens"]),
        ];
        assert_eq!(
            pick_fallback_model(&models).as_deref(),
            Some("gemini-2.0-flash")
        );

        let models = vec![model("models/text-bison", &["generateContent"])];
        assert_eq!(pick_fallback_model(&models).as_deref(), Some("text-bison"));

        let models = vec![model("models/embedding-001", &["embedContent"])];
        assert_eq!(pick_fallback_model(&models), None);
    }
}
