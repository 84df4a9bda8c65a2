use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::core::trivia::{
    Category, QuestionBatch, QuestionQuery, QuestionSource, ResponseCode, TriviaError,
    TriviaQuestion,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the Open Trivia Database (https://opentdb.com).
///
/// Questions are requested with `encode=base64` so HTML entities and
/// unicode survive the trip; every string field is decoded before it
/// leaves this module.
pub struct OpenTriviaClient {
    client: Client,
    base_url: String,
}

impl OpenTriviaClient {
    pub fn new() -> Result<Self, TriviaError> {
        Self::with_base_url("https://opentdb.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, TriviaError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("User-Agent", HeaderValue::from_static("SignalRankBot/0.1"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TriviaError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, path: &str, params: &[(&str, String)]) -> Result<String, TriviaError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| TriviaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // The API answers 429 when called more than once every 5 seconds.
            if status.as_u16() == 429 {
                return Err(TriviaError::RateLimited);
            }
            return Err(TriviaError::Network(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TriviaError::Network(e.to_string()))
    }
}

/// Build the query string pairs for a question request.
fn question_params(query: &QuestionQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("amount", query.amount.to_string()),
        ("type", query.kind.as_api_str().to_string()),
        ("encode", "base64".to_string()),
    ];
    if let Some(category) = query.category {
        params.push(("category", category.to_string()));
    }
    if let Some(difficulty) = query.difficulty {
        params.push(("difficulty", difficulty.as_api_str().to_string()));
    }
    if let Some(token) = &query.token {
        params.push(("token", token.clone()));
    }
    params
}

fn decode_field(raw: &str) -> Result<String, TriviaError> {
    let bytes = BASE64
        .decode(raw.trim())
        .map_err(|e| TriviaError::Decode(format!("invalid base64: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| TriviaError::Decode(format!("invalid utf-8: {}", e)))
}

fn decode_question(raw: ApiQuestion) -> Result<TriviaQuestion, TriviaError> {
    Ok(TriviaQuestion {
        category: decode_field(&raw.category)?,
        difficulty: decode_field(&raw.difficulty)?,
        question: decode_field(&raw.question)?,
        correct_answer: decode_field(&raw.correct_answer)?,
        incorrect_answers: raw
            .incorrect_answers
            .iter()
            .map(|a| decode_field(a))
            .collect::<Result<_, _>>()?,
    })
}

/// Parse an `api.php` body fetched with `encode=base64`.
fn parse_question_batch(body: &str) -> Result<QuestionBatch, TriviaError> {
    let api: ApiQuestionsResponse =
        serde_json::from_str(body).map_err(|e| TriviaError::Decode(e.to_string()))?;

    let questions = api
        .results
        .into_iter()
        .map(decode_question)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuestionBatch {
        response_code: ResponseCode::from(api.response_code),
        questions,
    })
}

fn parse_token(body: &str) -> Result<String, TriviaError> {
    let api: ApiTokenResponse =
        serde_json::from_str(body).map_err(|e| TriviaError::Decode(e.to_string()))?;

    match (ResponseCode::from(api.response_code), api.token) {
        (ResponseCode::Success, Some(token)) if !token.is_empty() => Ok(token),
        (ResponseCode::RateLimited, _) => Err(TriviaError::RateLimited),
        (code, _) => Err(TriviaError::Decode(format!(
            "token request failed ({:?}): {}",
            code,
            api.response_message.unwrap_or_default()
        ))),
    }
}

fn parse_categories(body: &str) -> Result<Vec<Category>, TriviaError> {
    let api: ApiCategoriesResponse =
        serde_json::from_str(body).map_err(|e| TriviaError::Decode(e.to_string()))?;
    let mut categories: Vec<Category> = api
        .trivia_categories
        .into_iter()
        .map(|c| Category {
            id: c.id,
            name: c.name,
        })
        .collect();
    categories.sort_by_key(|c| c.id);
    Ok(categories)
}

#[async_trait]
impl QuestionSource for OpenTriviaClient {
    async fn request_token(&self) -> Result<String, TriviaError> {
        let body = self
            .get_text("api_token.php", &[("command", "request".to_string())])
            .await?;
        parse_token(&body)
    }

    async fn reset_token(&self, token: &str) -> Result<(), TriviaError> {
        let body = self
            .get_text(
                "api_token.php",
                &[
                    ("command", "reset".to_string()),
                    ("token", token.to_string()),
                ],
            )
            .await?;
        parse_token(&body).map(|_| ())
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<QuestionBatch, TriviaError> {
        let body = self.get_text("api.php", &question_params(query)).await?;
        parse_question_batch(&body)
    }

    async fn categories(&self) -> Result<Vec<Category>, TriviaError> {
        let body = self.get_text("api_category.php", &[]).await?;
        parse_categories(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ApiTokenResponse {
    response_code: i64,
    response_message: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiQuestionsResponse {
    response_code: i64,
    #[serde(default)]
    results: Vec<ApiQuestion>,
}

#[derive(Debug, Deserialize)]
struct ApiQuestion {
    category: String,
    difficulty: String,
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCategoriesResponse {
    trivia_categories: Vec<ApiCategory>,
}

#[derive(Debug, Deserialize)]
struct ApiCategory {
    id: u32,
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trivia::{Difficulty, QuestionKind};

    fn b64(s: &str) -> String {
        BASE64.encode(s)
    }

    #[test]
    fn decodes_base64_question_batch() {
        let body = format!(
            r#"{{"response_code":0,"results":[{{"type":"{}","difficulty":"{}","category":"{}","question":"{}","correct_answer":"{}","incorrect_answers":["{}","{}","{}"]}}]}}"#,
            b64("multiple"),
            b64("medium"),
            b64("Entertainment: Video Games"),
            b64("Which company made \"Pokémon\"?"),
            b64("Game Freak"),
            b64("Nintendo"),
            b64("Sega"),
            b64("Atlus"),
        );

        let batch = parse_question_batch(&body).unwrap();
        assert_eq!(batch.response_code, ResponseCode::Success);
        assert_eq!(batch.questions.len(), 1);

        let q = &batch.questions[0];
        assert_eq!(q.question, "Which company made \"Pokémon\"?");
        assert_eq!(q.correct_answer, "Game Freak");
        assert_eq!(q.incorrect_answers, vec!["Nintendo", "Sega", "Atlus"]);
        assert_eq!(q.difficulty, "medium");
    }

    #[test]
    fn error_code_without_results_still_parses() {
        let batch = parse_question_batch(r#"{"response_code":4,"results":[]}"#).unwrap();
        assert_eq!(batch.response_code, ResponseCode::TokenEmpty);
        assert!(batch.questions.is_empty());

        let batch = parse_question_batch(r#"{"response_code":5}"#).unwrap();
        assert_eq!(batch.response_code, ResponseCode::RateLimited);
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let body = r#"{"response_code":0,"results":[{"type":"x","difficulty":"!!","category":"x","question":"x","correct_answer":"x","incorrect_answers":[]}]}"#;
        assert!(matches!(
            parse_question_batch(body),
            Err(TriviaError::Decode(_))
        ));
    }

    #[test]
    fn parses_token_responses() {
        let ok = r#"{"response_code":0,"response_message":"Token Generated Successfully!","token":"abc123"}"#;
        assert_eq!(parse_token(ok).unwrap(), "abc123");

        let limited = r#"{"response_code":5}"#;
        assert!(matches!(parse_token(limited), Err(TriviaError::RateLimited)));

        let bad = r#"{"response_code":3,"response_message":"Token Not Found"}"#;
        assert!(matches!(parse_token(bad), Err(TriviaError::Decode(_))));
    }

    #[test]
    fn categories_are_sorted_by_id() {
        let body = r#"{"trivia_categories":[{"id":18,"name":"Science: Computers"},{"id":9,"name":"General Knowledge"}]}"#;
        let categories = parse_categories(body).unwrap();
        assert_eq!(categories[0].id, 9);
        assert_eq!(categories[1].name, "Science: Computers");
    }

    #[test]
    fn query_params_include_only_set_filters() {
        let mut query = QuestionQuery {
            amount: 5,
            category: None,
            difficulty: None,
            kind: QuestionKind::Multiple,
            token: None,
        };
        let params = question_params(&query);
        let keys: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["amount", "type", "encode"]);

        query.category = Some(9);
        query.difficulty = Some(Difficulty::Easy);
        query.token = Some("tok".into());
        let params = question_params(&query);
        assert!(params.contains(&("category", "9".to_string())));
        assert!(params.contains(&("difficulty", "easy".to_string())));
        assert!(params.contains(&("token", "tok".to_string())));
        assert!(params.contains(&("type", "multiple".to_string())));
    }
}
