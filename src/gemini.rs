//! Google Gemini `generateContent` transport.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::model::{ContentPart, GenerativeModel, ServiceError};

const MAX_LOGGED_BODY: usize = 500;

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> From<&'a ContentPart> for Part<'a> {
    fn from(part: &'a ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Part::Text { text },
            ContentPart::InlineData { mime_type, data } => Part::InlineData {
                inline_data: InlineData { mime_type, data },
            },
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client for the Gemini API. Built once from configuration and shared.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url, config.model
            ),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, parts: Vec<ContentPart>) -> Result<String, ServiceError> {
        let payload = GenerateContentRequest {
            contents: [Content {
                parts: parts.iter().map(Part::from).collect(),
            }],
        };

        tracing::debug!(endpoint = %self.endpoint, parts = parts.len(), "sending request to Gemini");

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(%status, body = %truncate(&body), "Gemini responded");

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
        response_text(parsed)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> ServiceError {
    // Gemini reports a bad key as 400 with reason API_KEY_INVALID.
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("API_KEY_INVALID")
    {
        ServiceError::Unauthorized(status)
    } else {
        ServiceError::Status {
            status,
            body: truncate(body),
        }
    }
}

/// Concatenates the text parts of the first candidate. A candidate without
/// text yields an empty string; a response without candidates is malformed.
fn response_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Malformed("no candidates in response".to_string()))?;

    Ok(candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_LOGGED_BODY).collect()
}
